//! Embedded HTML/CSS/JS frontend for the browser dashboard.
//!
//! The page holds no dashboard state of its own: it polls `/api/state` and
//! redraws, and every action is a POST whose response carries the new state.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Nexus AGI Dashboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --cyan: #39d2c0;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 16px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; color: var(--purple); }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.conn { display: flex; align-items: center; gap: 8px; color: var(--text-muted); }
.dot { width: 8px; height: 8px; border-radius: 50%; background: var(--text-muted); }
.dot.connected { background: var(--green); }
.dot.disconnected { background: var(--red); }

nav { display: flex; gap: 4px; margin-bottom: 16px; }
nav button, .toggle button {
  background: transparent;
  color: var(--text-muted);
  border: 1px solid transparent;
  border-radius: var(--radius);
  padding: 6px 14px;
  cursor: pointer;
  font: inherit;
}
nav button.active, .toggle button.active {
  background: var(--surface);
  color: var(--text);
  border-color: var(--border);
}

.layout { display: grid; grid-template-columns: 1fr 300px; gap: 16px; }
.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
}
.card h2 { font-size: 15px; margin-bottom: 12px; color: var(--cyan); }
.muted { color: var(--text-muted); }
.empty { color: var(--text-muted); text-align: center; padding: 32px 0; }

.messages { height: 480px; overflow-y: auto; display: flex; flex-direction: column; gap: 10px; }
.msg { max-width: 75%; padding: 10px 14px; border-radius: var(--radius); white-space: pre-wrap; }
.msg.user { align-self: flex-end; background: var(--accent); color: #0d1117; }
.msg.assistant { align-self: flex-start; background: var(--bg); border: 1px solid var(--border); }
.msg .meta { font-size: 11px; color: var(--text-muted); margin-top: 6px; }
.msg.user .meta { color: #0d1117; opacity: 0.7; }
.tools-used span {
  font-family: var(--mono);
  font-size: 11px;
  background: var(--surface);
  padding: 1px 6px;
  border-radius: 4px;
  margin-right: 4px;
}

form.inline { display: flex; gap: 8px; margin-top: 12px; }
form.inline input {
  flex: 1;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 8px 12px;
  font: inherit;
}
form.inline button {
  background: var(--accent);
  color: #0d1117;
  border: none;
  border-radius: var(--radius);
  padding: 8px 16px;
  font-weight: 600;
  cursor: pointer;
}
form.inline button:disabled { opacity: 0.5; cursor: default; }

.item { border-bottom: 1px solid var(--border); padding: 10px 0; }
.item:last-child { border-bottom: none; }
.sim { color: var(--green); font-family: var(--mono); font-size: 12px; }
.keyword {
  display: inline-block;
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 4px;
  padding: 0 6px;
  margin-right: 4px;
}
.freq { color: var(--yellow); font-family: var(--mono); }

.bar { height: 6px; background: var(--bg); border-radius: 3px; overflow: hidden; margin: 6px 0; }
.bar > div { height: 100%; background: linear-gradient(90deg, var(--accent), var(--purple)); }

.tier { font-size: 11px; padding: 1px 8px; border-radius: 10px; border: 1px solid currentColor; }
.tier.Expert { color: var(--purple); }
.tier.Advanced { color: var(--accent); }
.tier.Intermediate { color: var(--green); }
.tier.Beginner { color: var(--yellow); }

.stat { display: flex; justify-content: space-between; padding: 6px 0; }
.stat b { font-size: 18px; }

.tool-icon { font-family: var(--mono); color: var(--cyan); margin-right: 6px; }
.param { font-family: var(--mono); font-size: 12px; color: var(--text-muted); }
.param b { color: var(--yellow); font-weight: normal; }

footer { margin-top: 24px; text-align: center; color: var(--text-muted); font-size: 12px; }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1>Nexus AGI</h1>
      <div class="subtitle">Advanced Autonomous Agent</div>
    </div>
    <div class="conn"><div id="dot" class="dot"></div><span id="conn">Checking</span></div>
  </header>

  <nav id="tabs"></nav>

  <div class="layout">
    <main class="card" id="panel"></main>
    <aside class="card" id="stats"></aside>
  </div>

  <footer id="footer"></footer>
</div>

<script>
const TABS = [['chat', 'Chat'], ['memory', 'Memory'], ['learning', 'Learning'], ['tools', 'Tools']];
const ICONS = { code: '</>', file: '[f]', calculator: '[=]', globe: '(@)', wrench: '[*]' };

let state = null;
let drafts = { chat: '', search: '' };

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

const ESCAPES = { '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' };

// Safe for both element text and quoted attribute values.
function esc(s) {
  return (s == null ? '' : String(s)).replace(/[&<>"']/g, c => ESCAPES[c]);
}

async function refresh() {
  try {
    state = await api('GET', '/api/state');
    render();
  } catch (e) {
    document.getElementById('conn').textContent = 'Dashboard offline';
  }
}

async function act(path, body) {
  const resp = await api('POST', path, body);
  if (resp.state) {
    state = Object.assign({}, state, resp.state);
    render();
  }
  return resp;
}

function render() {
  if (!state) return;
  const dot = document.getElementById('dot');
  dot.className = 'dot ' + state.connection;
  document.getElementById('conn').textContent = state.connection_label;
  document.getElementById('footer').textContent = 'Backend: ' + (state.api_url || '');

  document.getElementById('tabs').innerHTML = TABS.map(([id, label]) =>
    `<button class="${state.tab === id ? 'active' : ''}" onclick="act('/api/tab', {tab: '${id}'})">${label}</button>`
  ).join('');

  const panel = state.panel;
  const el = document.getElementById('panel');
  if (panel.kind === 'chat') renderChat(el, panel.data);
  else if (panel.kind === 'memory') renderMemory(el, panel.data);
  else if (panel.kind === 'learning') renderLearning(el, panel.data);
  else renderTools(el, panel.data);

  renderStats(document.getElementById('stats'), state.stats);
}

function renderChat(el, chat) {
  let html = '<div class="messages" id="messages">';
  if (chat.messages.length === 0 && !chat.pending) {
    html += '<div class="empty"><h2>Welcome to Nexus AGI</h2>' +
      '<p>I\'m an advanced autonomous agent with memory, learning, and tool-use capabilities.<br>Ask me anything!</p></div>';
  }
  for (const m of chat.messages) {
    html += `<div class="msg ${m.role}">${esc(m.content)}`;
    if (m.tools.length) {
      html += '<div class="meta tools-used">Tools used: ' + m.tools.map(t => `<span>${esc(t)}</span>`).join('') + '</div>';
    }
    if (m.pattern_detected) html += `<div class="meta">Pattern: ${esc(m.pattern_detected)}</div>`;
    if (m.memories_used) html += `<div class="meta">${m.memories_used} memories used</div>`;
    html += `<div class="meta">${esc(m.time)}</div></div>`;
  }
  if (chat.pending) html += '<div class="msg assistant muted">Thinking...</div>';
  html += '</div>';
  html += `<form class="inline" onsubmit="sendChat(event)">
    <input id="chat-input" placeholder="Type your message..." value="${esc(drafts.chat)}"
      oninput="drafts.chat = this.value" ${chat.pending ? 'disabled' : ''}>
    <button ${chat.pending ? 'disabled' : ''}>Send</button></form>`;
  el.innerHTML = html;

  // Redrawing resets the scroll position; keep the newest message in view.
  const box = document.getElementById('messages');
  box.scrollTop = box.scrollHeight;
  const input = document.getElementById('chat-input');
  if (!chat.pending) input.focus();
}

async function sendChat(ev) {
  ev.preventDefault();
  const text = drafts.chat;
  if (!text.trim()) return;
  const resp = await act('/api/chat', { message: text });
  if (resp.accepted) {
    drafts.chat = '';
    render();
  }
}

function renderMemory(el, mem) {
  let html = `<div class="toggle">
    <button class="${mem.view === 'search' ? 'active' : ''}" onclick="act('/api/memory/view', {view: 'search'})">Search</button>
    <button class="${mem.view === 'episodes' ? 'active' : ''}" onclick="act('/api/memory/view', {view: 'episodes'})">Episodes</button>
  </div>`;
  if (mem.view === 'search') {
    html += `<form class="inline" onsubmit="search(event)">
      <input id="search-input" placeholder="Search memories..." value="${esc(drafts.search)}"
        oninput="drafts.search = this.value">
      <button>Search</button></form>`;
    if (mem.memories.length === 0) {
      html += '<div class="empty">Search to find relevant memories</div>';
    }
    for (const m of mem.memories) {
      html += `<div class="item"><div><span class="sim">Similarity: ${esc(m.similarity)}</span>
        <span class="muted"> ${esc(m.timestamp || '')}</span></div><div>${esc(m.content)}</div></div>`;
    }
  } else {
    if (mem.episodes.length === 0) html += '<div class="empty">No episodes yet</div>';
    for (const e of mem.episodes) {
      html += `<div class="item"><div><b>User:</b> ${esc(e.user_message)}</div>
        <div><b>Agent:</b> ${esc(e.agent_preview)}</div>
        <div class="muted">${esc(e.timestamp)} ${e.tools_used.map(t => `<span class="keyword">${esc(t)}</span>`).join('')}</div></div>`;
    }
  }
  el.innerHTML = html;
}

async function search(ev) {
  ev.preventDefault();
  if (!drafts.search.trim()) return;
  await act('/api/memory/search', { query: drafts.search });
}

function renderLearning(el, learning) {
  let html = '<h2>Detected Patterns</h2>';
  if (learning.patterns.length === 0) html += '<div class="empty">No patterns detected yet</div>';
  for (const p of learning.patterns) {
    html += `<div class="item">${p.keywords.map(k => `<span class="keyword">${esc(k)}</span>`).join('')}
      <span class="freq">×${p.frequency}</span>
      <div class="muted">Last seen: ${esc(p.last_seen)}</div></div>`;
  }
  html += '<h2 style="margin-top:16px">Learned Skills</h2>';
  if (learning.skills.length === 0) html += '<div class="empty">No skills learned yet</div>';
  for (const s of learning.skills) {
    html += `<div class="item"><b>${esc(s.name)}</b> <span class="tier ${s.tier}">${s.tier_label}</span>
      <span class="muted" style="float:right">Level ${esc(s.level)}</span>
      <div class="bar"><div style="width:${s.bar_percent}%"></div></div>
      <div class="muted">Uses: ${s.uses} &nbsp; Success: ${esc(s.success)}</div></div>`;
  }
  el.innerHTML = html;
}

function renderTools(el, tools) {
  let html = '<h2>Available Tools</h2>';
  if (tools.state === 'loading') {
    html += '<div class="empty">Loading tools...</div>';
  } else if (tools.tools.length === 0) {
    html += '<div class="empty">No tools registered</div>';
  } else {
    for (const t of tools.tools) {
      html += `<div class="item"><span class="tool-icon">${esc(ICONS[t.icon] || '')}</span><b>${esc(t.name)}</b>
        <div class="muted">${esc(t.description)}</div>
        ${t.parameters.map(p => `<div class="param">${esc(p.name)}: <b>${esc(p.type)}</b></div>`).join('')}</div>`;
    }
  }
  el.innerHTML = html;
}

function renderStats(el, stats) {
  let html = '<h2>System Statistics</h2>';
  if (stats.state === 'loading') {
    el.innerHTML = html + '<div class="empty">Loading...</div>';
    return;
  }
  for (const c of stats.cards) html += `<div class="stat"><span class="muted">${c.label}</span><b>${c.value}</b></div>`;
  if (stats.avg_skill) {
    html += `<div class="stat"><span class="muted">Avg Skill Level</span><span>${esc(stats.avg_skill.level)} / 10</span></div>
      <div class="bar"><div style="width:${stats.avg_skill.percent}%"></div></div>`;
  }
  if (stats.top_skills.length) {
    html += '<h2 style="margin-top:12px">Top Skills</h2>';
    for (const s of stats.top_skills) html += `<div class="stat"><span>${esc(s.name)}</span><span class="muted">Lvl ${esc(s.level)}</span></div>`;
  }
  el.innerHTML = html;
}

function editing() {
  const a = document.activeElement;
  return a && a.tagName === 'INPUT' && a.id !== 'chat-input';
}

refresh();
setInterval(() => { if (!editing()) refresh(); }, 1000);
</script>
</body>
</html>
"##;
