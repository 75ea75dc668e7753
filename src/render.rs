// src/render.rs
//! Static digest page: markup shell + today's items as embedded JSON + the
//! client program that reconciles them with the favorites kept in
//! `localStorage`. Nothing here talks to the network.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::assemble::{DigestItem, Tag};
use crate::config::DigestConfig;
use crate::favorites::View;

pub const EMPTY_FEED_MESSAGE: &str = "今日暂无高热度内容，去 B 站搜搜看？";
pub const EMPTY_FAVORITES_MESSAGE: &str = "还没有收藏，点击卡片上的 ☆ 收藏感兴趣的内容。";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("serializing embedded data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Page-level values that are not items.
#[derive(Debug, Clone)]
pub struct RenderMeta {
    pub date_label: String,
    pub generated_at: String,
    pub storage_key: String,
    pub search_link_base: String,
}

impl RenderMeta {
    pub fn from_config(cfg: &DigestConfig, now: chrono::DateTime<chrono::Local>) -> Self {
        Self {
            date_label: now.format("%m月%d日").to_string(),
            generated_at: now.format("%Y-%m-%d %H:%M").to_string(),
            storage_key: cfg.favorites_storage_key.clone(),
            search_link_base: cfg.search_link_base.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig<'a> {
    storage_key: &'a str,
    search_base: &'a str,
    tag_labels: [(Tag, &'static str); 2],
    empty_feed: &'static str,
    empty_favorites: &'static str,
    headings: [&'static str; 2],
    count_units: [&'static str; 2],
}

/// JSON that is safe inside `<script>`: `<` never appears literally, so
/// neither `</script>` nor `<!--` can end the block early.
pub fn embed_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

pub fn render(items: &[DigestItem], meta: &RenderMeta) -> Result<String, RenderError> {
    let items_json = embed_json(items)?;
    let client_cfg = ClientConfig {
        storage_key: &meta.storage_key,
        search_base: &meta.search_link_base,
        tag_labels: [
            (Tag::CommunityHighlight, Tag::CommunityHighlight.label()),
            (Tag::NewTool, Tag::NewTool.label()),
        ],
        empty_feed: EMPTY_FEED_MESSAGE,
        empty_favorites: EMPTY_FAVORITES_MESSAGE,
        headings: [View::Feed.heading(), View::Favorites.heading()],
        count_units: [View::Feed.count_unit(), View::Favorites.count_unit()],
    };
    let cfg_json = embed_json(&client_cfg)?;

    let initial_list = if items.is_empty() {
        format!(r#"<div class="empty">{}</div>"#, EMPTY_FEED_MESSAGE)
    } else {
        String::from(r#"<noscript><div class="empty">需要启用 JavaScript 才能浏览列表。</div></noscript>"#)
    };

    let html = PAGE_TEMPLATE
        .replace("{{DATE}}", &html_escape::encode_text(&meta.date_label))
        .replace("{{GENERATED_AT}}", &html_escape::encode_text(&meta.generated_at))
        .replace("{{HEADING}}", View::Feed.heading())
        .replace("{{COUNT}}", &items.len().to_string())
        .replace("{{COUNT_UNIT}}", View::Feed.count_unit())
        .replace("{{INITIAL_LIST}}", &initial_list)
        .replace("{{CLIENT_CONFIG}}", &cfg_json)
        .replace("{{CLIENT_PROGRAM}}", CLIENT_PROGRAM)
        .replace("{{ITEMS_JSON}}", &items_json);
    Ok(html)
}

/// Write via temp file + rename so a failed run never leaves half a page.
pub fn write_artifact(path: &Path, html: &str) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let tmp = path.with_extension("html.tmp");
    let mut f = fs::File::create(&tmp).map_err(io_err)?;
    f.write_all(html.as_bytes()).map_err(io_err)?;
    f.sync_all().map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

// ITEMS_JSON is substituted last so item text can never be mistaken for a placeholder.
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no, viewport-fit=cover">
<meta name="apple-mobile-web-app-capable" content="yes">
<meta name="apple-mobile-web-app-status-bar-style" content="black-translucent">
<title>{{HEADING}}</title>
<style>
body { margin: 0; background: #0a0a0a; color: #fff; font-family: 'Noto Sans SC', sans-serif; -webkit-font-smoothing: antialiased; }
.wrap { max-width: 28rem; margin: 0 auto; min-height: 100vh; padding-bottom: 6rem; }
header { position: sticky; top: 0; z-index: 50; padding: 3rem 1.5rem 1rem; background: rgba(0,0,0,.9); border-bottom: 1px solid rgba(255,255,255,.05); }
.head-row { display: flex; justify-content: space-between; align-items: center; }
h1 { margin: 0; font-size: 1.9rem; font-weight: 900; font-style: italic; }
.sub { font-size: 10px; color: #6b7280; letter-spacing: .15em; margin-top: .25rem; }
.badge-count { background: rgba(37,99,235,.2); color: #3b82f6; padding: .25rem .75rem; border-radius: 999px; font-size: 12px; font-weight: 700; }
.tabs { display: flex; gap: .5rem; margin-top: 1rem; }
.tabs button { flex: 1; padding: .5rem; border-radius: .75rem; border: 1px solid #262626; background: #141414; color: #9ca3af; font-weight: 700; }
.tabs button.active { background: #2563eb; color: #fff; border-color: #2563eb; }
main { padding: 1rem; }
.card { background: #141414; border: 1px solid #262626; border-radius: 1.5rem; padding: 1.25rem; margin-bottom: 1.25rem; }
.card-top { display: flex; justify-content: space-between; align-items: center; margin-bottom: .75rem; }
.tag { color: #fff; font-size: 10px; font-weight: 900; padding: .25rem .5rem; border-radius: .375rem; }
.tag.community_highlight { background: #f97316; }
.tag.new_tool { background: #2563eb; }
.score { color: #6b7280; font-size: 10px; font-weight: 700; }
.fav { background: none; border: 0; color: #facc15; font-size: 1.1rem; cursor: pointer; }
.card h2 { font-size: 1.1rem; margin: 0 0 .5rem; }
.card h2 a { color: #f3f4f6; text-decoration: none; }
.card p { font-size: 11px; color: #9ca3af; line-height: 1.6; margin: 0 0 1.25rem; }
.actions { display: grid; grid-template-columns: 1fr 1fr; gap: .75rem; }
.actions a { display: block; text-align: center; padding: .75rem 0; border-radius: .75rem; font-size: 10px; font-weight: 700; text-decoration: none; }
.src { background: rgba(255,255,255,.05); color: #d1d5db; }
.search { background: rgba(0,174,236,.1); color: #00aeec; }
.empty { padding: 5rem 0; text-align: center; color: #4b5563; }
footer { text-align: center; padding: 2.5rem 0; font-size: 10px; color: #374151; font-family: monospace; }
</style>
</head>
<body>
<div class="wrap">
<header>
  <div class="head-row">
    <div>
      <h1 id="view-title">{{HEADING}}</h1>
      <div class="sub">ComfyUI 精选日报 · {{DATE}}</div>
    </div>
    <div class="badge-count" id="view-count">{{COUNT}} {{COUNT_UNIT}}</div>
  </div>
  <nav class="tabs">
    <button type="button" data-view="feed" class="active">今日</button>
    <button type="button" data-view="favorites">收藏</button>
  </nav>
</header>
<main id="list">{{INITIAL_LIST}}</main>
<footer>Updated at 6:00 AM daily · {{GENERATED_AT}}</footer>
</div>
<script type="application/json" id="digest-config">{{CLIENT_CONFIG}}</script>
<script type="application/json" id="digest-data">{{ITEMS_JSON}}</script>
<script>
{{CLIENT_PROGRAM}}
</script>
</body>
</html>
"#;

/// Reconciliation program. Mirrors `favorites::FavoritesStore` /
/// `favorites::reconcile`: toggle inserts a full snapshot or removes by id,
/// every mutation rewrites the whole stored list, and the favorites view is a
/// reversed copy (newest addition first) that never touches the stored order.
const CLIENT_PROGRAM: &str = r#"(function () {
  'use strict';
  var TODAY = JSON.parse(document.getElementById('digest-data').textContent || '[]');
  var CFG = JSON.parse(document.getElementById('digest-config').textContent || '{}');
  var LABELS = {};
  (CFG.tagLabels || []).forEach(function (p) { LABELS[p[0]] = p[1]; });
  var view = 'feed';

  function loadFavorites() {
    try {
      var parsed = JSON.parse(localStorage.getItem(CFG.storageKey) || '[]');
      if (!Array.isArray(parsed)) return [];
      return parsed.filter(function (r) { return r && typeof r.id === 'string' && r.id; });
    } catch (e) {
      return [];
    }
  }

  function saveFavorites(list) {
    try {
      localStorage.setItem(CFG.storageKey, JSON.stringify(list));
    } catch (e) {
      console.warn('favorites not persisted', e);
    }
  }

  var favorites = loadFavorites();

  function isFavorite(id) {
    return favorites.some(function (r) { return r.id === id; });
  }

  function findToday(id) {
    for (var i = 0; i < TODAY.length; i++) {
      if (TODAY[i].id === id) return TODAY[i];
    }
    return null;
  }

  function toggle(id) {
    if (isFavorite(id)) {
      favorites = favorites.filter(function (r) { return r.id !== id; });
    } else {
      var item = findToday(id);
      if (!item) return;
      favorites = favorites.concat([JSON.parse(JSON.stringify(item))]);
    }
    saveFavorites(favorites);
    render();
  }

  function el(tag, cls, text) {
    var n = document.createElement(tag);
    if (cls) n.className = cls;
    if (text != null) n.textContent = text;
    return n;
  }

  function link(cls, href, text) {
    var a = el('a', cls, text);
    a.href = href;
    a.target = '_blank';
    a.rel = 'noopener';
    return a;
  }

  function card(item) {
    var root = el('div', 'card');
    var top = el('div', 'card-top');
    top.appendChild(el('span', 'tag ' + item.tag, LABELS[item.tag] || item.tag));
    var right = el('span');
    right.appendChild(el('span', 'score', item.score_label));
    var star = el('button', 'fav', isFavorite(item.id) ? '★' : '☆');
    star.type = 'button';
    star.setAttribute('data-fav', item.id);
    right.appendChild(star);
    top.appendChild(right);
    root.appendChild(top);

    var h2 = el('h2');
    h2.appendChild(link('', item.link, item.title_display));
    root.appendChild(h2);
    root.appendChild(el('p', '', item.summary));

    var kw = item.search_keyword || '';
    var actions = el('div', 'actions');
    actions.appendChild(link('src', item.link, '查看原文'));
    actions.appendChild(link('search', CFG.searchBase + encodeURIComponent(kw),
      '📺 B站搜 "' + kw.slice(0, 15) + '..."'));
    root.appendChild(actions);
    return root;
  }

  function visibleItems() {
    return view === 'favorites' ? favorites.slice().reverse() : TODAY;
  }

  function render() {
    var items = visibleItems();
    var list = document.getElementById('list');
    list.textContent = '';
    if (items.length === 0) {
      list.appendChild(el('div', 'empty', view === 'favorites' ? CFG.emptyFavorites : CFG.emptyFeed));
    } else {
      items.forEach(function (it) { list.appendChild(card(it)); });
    }
    var idx = view === 'favorites' ? 1 : 0;
    document.getElementById('view-count').textContent = items.length + ' ' + CFG.countUnits[idx];
    document.getElementById('view-title').textContent = CFG.headings[idx];
    document.title = CFG.headings[idx];
    var tabs = document.querySelectorAll('[data-view]');
    for (var i = 0; i < tabs.length; i++) {
      tabs[i].classList.toggle('active', tabs[i].getAttribute('data-view') === view);
    }
  }

  document.addEventListener('click', function (ev) {
    var t = ev.target;
    if (!(t instanceof Element)) return;
    var fav = t.closest('[data-fav]');
    if (fav) {
      ev.preventDefault();
      toggle(fav.getAttribute('data-fav'));
      return;
    }
    var tab = t.closest('[data-view]');
    if (tab) {
      view = tab.getAttribute('data-view') === 'favorites' ? 'favorites' : 'feed';
      render();
    }
  });

  window.addEventListener('storage', function (ev) {
    if (ev.key === CFG.storageKey) {
      favorites = loadFavorites();
      render();
    }
  });

  render();
})();"#;
