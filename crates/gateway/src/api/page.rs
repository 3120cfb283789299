//! `GET /`: a single-page chat UI that talks to `/v1/chat`.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>CodeMITRA</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 900px; margin: 2rem auto; padding: 0 1rem; background: #0d1117; color: #c9d1d9; }
  h1 { color: #58a6ff; margin-bottom: 0.2em; }
  .sub { color: #8b949e; margin-top: 0; }
  .turn { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 0.8rem 1rem; margin: 0.6rem 0; }
  .user { color: #79c0ff; font-weight: 600; white-space: pre-wrap; }
  .assistant { white-space: pre-wrap; margin-top: 0.5em; }
  .error { color: #f85149; }
  textarea { width: 100%; box-sizing: border-box; background: #0d1117; color: #c9d1d9; border: 1px solid #30363d; border-radius: 6px; padding: 0.6rem; font: inherit; }
  button { margin-top: 0.5rem; background: #238636; color: #fff; border: 0; border-radius: 6px; padding: 0.5rem 1.2rem; cursor: pointer; }
  button.secondary { background: #21262d; }
  button:disabled { opacity: 0.5; }
</style>
</head>
<body>
<h1>CodeMITRA</h1>
<p class="sub">Local code teaching assistant. Ask code questions, get examples and runnable snippets.</p>
<div id="log"></div>
<textarea id="msg" rows="3" placeholder="Ask a code question..."></textarea>
<button id="send">Send</button>
<button id="reset" class="secondary">New conversation</button>
<script>
  const log = document.getElementById('log');
  const msg = document.getElementById('msg');
  const send = document.getElementById('send');
  let sessionKey = localStorage.getItem('codemitra_session');

  function render(turns) {
    log.innerHTML = '';
    for (const t of turns) {
      const div = document.createElement('div');
      div.className = 'turn';
      const u = document.createElement('div');
      u.className = 'user';
      u.textContent = t.user;
      const a = document.createElement('div');
      a.className = 'assistant' + (t.assistant.startsWith('[Error]') ? ' error' : '');
      a.textContent = t.assistant || '...';
      div.append(u, a);
      log.append(div);
    }
    window.scrollTo(0, document.body.scrollHeight);
  }

  async function submit() {
    const text = msg.value;
    if (!text.trim()) return;
    send.disabled = true;
    try {
      const resp = await fetch('/v1/chat', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ session_key: sessionKey, message: text }),
      });
      const data = await resp.json();
      sessionKey = data.session_key;
      localStorage.setItem('codemitra_session', sessionKey);
      msg.value = '';
      render(data.turns);
    } finally {
      send.disabled = false;
    }
  }

  send.addEventListener('click', submit);
  msg.addEventListener('keydown', (e) => {
    if (e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); submit(); }
  });
  document.getElementById('reset').addEventListener('click', async () => {
    if (sessionKey) {
      await fetch('/v1/sessions/' + encodeURIComponent(sessionKey) + '/reset', { method: 'POST' });
    }
    render([]);
  });

  if (sessionKey) {
    fetch('/v1/sessions/' + encodeURIComponent(sessionKey) + '/turns')
      .then((r) => r.json())
      .then((d) => render(d.turns));
  }
</script>
</body>
</html>
"#;
