//! Browser-side script for rendering contexts.

use lander_config::Section;
use lander_store::STORAGE_KEY;

use crate::message::PROTOCOL_VERSION;

/// Generate the script a rendering context loads to follow the editor.
///
/// The script bootstraps from the published global, then the cross-session
/// slot, then the session slot. It exposes `window.landerPreview.subscribe`
/// for the page to register its render function, and applies `CONFIG_UPDATE`
/// messages arriving over the WebSocket at `ws_url` or via `postMessage` from
/// one of `allowed_origins`. Like [`Renderer`](crate::Renderer), it only
/// accepts payloads carrying every top-level section.
pub fn preview_client_script(ws_url: &str, allowed_origins: &[String]) -> String {
    let ws_url = serde_json::to_string(ws_url).unwrap_or_else(|_| "\"\"".to_string());
    let allowed = serde_json::to_string(allowed_origins).unwrap_or_else(|_| "[]".to_string());
    let sections: Vec<&str> = Section::ALL.iter().map(Section::as_str).collect();
    let sections = serde_json::to_string(&sections).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"
(function() {{
  'use strict';

  var STORAGE_KEY = '{key}';
  var VERSION = {version};
  var ALLOWED_ORIGINS = {allowed};
  var SECTIONS = {sections};
  var subscribers = [];
  var current = window.__LANDING_CONFIG__ || null;

  function readSlot(storage) {{
    try {{
      var raw = storage.getItem(STORAGE_KEY);
      return raw ? JSON.parse(raw) : null;
    }} catch (e) {{
      return null;
    }}
  }}

  if (!current) {{
    current = readSlot(window.localStorage) || readSlot(window.sessionStorage);
  }}

  function isComplete(config) {{
    if (!config || typeof config !== 'object') return false;
    return SECTIONS.every(function(key) {{ return key in config; }});
  }}

  function apply(config) {{
    current = config;
    subscribers.forEach(function(fn) {{
      try {{
        fn(config);
      }} catch (e) {{
        console.error('[preview] Subscriber failed:', e);
      }}
    }});
  }}

  function handle(msg) {{
    if (typeof msg === 'string') {{
      try {{
        msg = JSON.parse(msg);
      }} catch (e) {{
        return;
      }}
    }}
    if (!msg || msg.kind !== 'CONFIG_UPDATE') return;
    if (msg.version !== VERSION) {{
      console.warn('[preview] Ignoring message with protocol version', msg.version);
      return;
    }}
    if (!isComplete(msg.config)) {{
      console.warn('[preview] Ignoring incomplete configuration');
      return;
    }}
    apply(msg.config);
  }}

  window.landerPreview = {{
    subscribe: function(fn) {{
      subscribers.push(fn);
      if (current) fn(current);
      return function() {{
        subscribers = subscribers.filter(function(s) {{ return s !== fn; }});
      }};
    }},
    current: function() {{
      return current;
    }}
  }};

  window.addEventListener('message', function(event) {{
    if (ALLOWED_ORIGINS.indexOf(event.origin) === -1) {{
      console.warn('[preview] Rejected message from', event.origin);
      return;
    }}
    handle(event.data);
  }});

  var ws = new WebSocket({ws_url});

  ws.onmessage = function(event) {{
    handle(event.data);
  }};

  ws.onclose = function() {{
    console.log('[preview] Disconnected from editor');
  }};

  ws.onerror = function(e) {{
    console.error('[preview] WebSocket error:', e);
  }};
}})();
"#,
        key = STORAGE_KEY,
        version = PROTOCOL_VERSION,
        allowed = allowed,
        ws_url = ws_url,
        sections = sections,
    )
}
