use crate::clock::ClockReading;
use crate::models::TaskCounts;
use crate::render::escape_html;
use crate::tasks::{TaskError, CLEAR_PROMPT, REMOVE_PROMPT};

pub struct PageContext {
    pub rows_html: String,
    pub counts: TaskCounts,
    pub clock: ClockReading,
    pub city: String,
}

pub fn render_index(page: &PageContext) -> String {
    let total = page.counts.total.to_string();
    let completed = page.counts.completed.to_string();
    let pending = page.counts.pending.to_string();
    let empty_text = escape_html(&TaskError::EmptyText.to_string());
    let city = escape_html(&page.city);

    fill_template(
        INDEX_HTML,
        &[
            ("ROWS", page.rows_html.as_str()),
            ("TOTAL", total.as_str()),
            ("COMPLETED", completed.as_str()),
            ("PENDING", pending.as_str()),
            ("TIME", page.clock.time.as_str()),
            ("DATE", page.clock.date.as_str()),
            ("CITY", city.as_str()),
            ("REMOVE_PROMPT", REMOVE_PROMPT),
            ("CLEAR_PROMPT", CLEAR_PROMPT),
            ("EMPTY_TEXT", empty_text.as_str()),
        ],
    )
}

/// Replaces `{{KEY}}` markers in one pass, so substituted values are never
/// scanned for further markers.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Tasks</title>
  <style>
    :root {
      --bg-1: #eef3f0;
      --bg-2: #cfe3d8;
      --ink: #1f2a27;
      --muted: #66736e;
      --accent: #2f8f6b;
      --accent-2: #c2504a;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(31, 42, 39, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #f7faf8 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    .top {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(31, 42, 39, 0.08);
      display: grid;
      gap: 6px;
    }

    .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    #time {
      font-size: 2rem;
      font-weight: 600;
      font-variant-numeric: tabular-nums;
    }

    #city {
      font-weight: 600;
      cursor: text;
    }

    #weather-status[data-type="error"],
    #status[data-type="error"] {
      color: var(--accent-2);
    }

    .add {
      display: flex;
      gap: 12px;
    }

    input[type="text"] {
      flex: 1;
      border: 1px solid rgba(31, 42, 39, 0.2);
      border-radius: 12px;
      padding: 12px 14px;
      font-size: 1rem;
      font-family: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    #task-list {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .task {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
      background: white;
      border-radius: 12px;
      padding: 10px 14px;
      border: 1px solid rgba(31, 42, 39, 0.08);
    }

    .task-text {
      flex: 1;
      cursor: pointer;
      word-break: break-word;
    }

    .task-text.done {
      text-decoration: line-through;
      color: var(--muted);
    }

    .task-delete {
      background: transparent;
      padding: 4px 8px;
    }

    .counters {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 12px;
      text-align: center;
    }

    .counters .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    .delete-all button {
      background: var(--accent-2);
    }

    .status {
      min-height: 1.2em;
      color: var(--muted);
      font-size: 0.9rem;
      margin: 0;
    }
  </style>
</head>
<body data-remove-prompt="{{REMOVE_PROMPT}}" data-clear-prompt="{{CLEAR_PROMPT}}" data-empty-text="{{EMPTY_TEXT}}">
  <main class="app">
    <section class="top">
      <div class="card">
        <span class="label">Now</span>
        <span id="time">{{TIME}}</span>
        <span id="date">{{DATE}}</span>
      </div>
      <div class="card">
        <span class="label">Weather in <span id="city" title="Double-click to change">{{CITY}}</span></span>
        <span id="weather">Loading...</span>
        <span id="weather-status" class="status"></span>
      </div>
    </section>

    <section class="add">
      <input id="task-input" type="text" placeholder="New task" autocomplete="off" />
      <button id="add-btn" type="button">Add</button>
    </section>

    <ul id="task-list">
{{ROWS}}
    </ul>

    <section class="counters">
      <div class="card"><span class="label">Total</span><span id="total-tasks" class="value">{{TOTAL}}</span></div>
      <div class="card"><span class="label">Completed</span><span id="completed-tasks" class="value">{{COMPLETED}}</span></div>
      <div class="card"><span class="label">Pending</span><span id="pending-tasks" class="value">{{PENDING}}</span></div>
    </section>

    <section class="delete-all">
      <button id="delete-all-btn" type="button">Delete all</button>
    </section>

    <p id="status" class="status"></p>
  </main>

  <script>
    const list = document.getElementById('task-list');
    const input = document.getElementById('task-input');
    const addBtn = document.getElementById('add-btn');
    const deleteAllBtn = document.getElementById('delete-all-btn');
    const statusEl = document.getElementById('status');
    const totalEl = document.getElementById('total-tasks');
    const completedEl = document.getElementById('completed-tasks');
    const pendingEl = document.getElementById('pending-tasks');
    const { removePrompt, clearPrompt, emptyText } = document.body.dataset;

    const setStatus = (el, message, type) => {
      el.textContent = message || '';
      el.dataset.type = type || 'info';
    };

    const request = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        throw new Error(await res.text());
      }
      return res.json();
    };

    const updateCounts = (counts) => {
      totalEl.textContent = counts.total;
      completedEl.textContent = counts.completed;
      pendingEl.textContent = counts.pending;
    };

    const rowFromHtml = (html) => {
      const template = document.createElement('template');
      template.innerHTML = html.trim();
      return template.content.firstElementChild;
    };

    // A response without a row for `targetId` means the server no longer
    // holds that task, so its element is dropped.
    const applyChange = (change, targetId = null) => {
      updateCounts(change.counts);
      setStatus(statusEl, change.warning, change.warning ? 'error' : 'info');
      if (change.removed_id != null) {
        document.getElementById(`task-${change.removed_id}`)?.remove();
      }
      if (change.task && change.row_html) {
        const row = rowFromHtml(change.row_html);
        const existing = document.getElementById(`task-${change.task.id}`);
        if (existing) {
          existing.replaceWith(row);
        } else {
          list.appendChild(row);
        }
      } else if (targetId != null) {
        document.getElementById(`task-${targetId}`)?.remove();
      }
    };

    const reportError = (err) => setStatus(statusEl, err.message, 'error');

    const addTask = async () => {
      const text = input.value.trim();
      if (text === '') {
        alert(emptyText);
        return;
      }
      try {
        applyChange(await request('POST', '/api/tasks', { text }));
        input.value = '';
      } catch (err) {
        alert(err.message);
      }
    };

    addBtn.addEventListener('click', addTask);
    input.addEventListener('keydown', (event) => {
      if (event.key === 'Enter') {
        addTask();
      }
    });

    let pendingToggle = null;

    list.addEventListener('click', async (event) => {
      const row = event.target.closest('.task');
      if (!row) {
        return;
      }
      const id = row.dataset.id;
      if (event.target.closest('.task-delete')) {
        if (!confirm(removePrompt)) {
          return;
        }
        try {
          applyChange(await request('DELETE', `/api/tasks/${id}`, { confirmed: true }), id);
        } catch (err) {
          reportError(err);
        }
        return;
      }
      if (event.target.closest('.task-text')) {
        clearTimeout(pendingToggle);
        pendingToggle = setTimeout(async () => {
          try {
            applyChange(await request('POST', `/api/tasks/${id}/toggle`), id);
          } catch (err) {
            reportError(err);
          }
        }, 220);
      }
    });

    list.addEventListener('dblclick', (event) => {
      const span = event.target.closest('.task-text');
      if (!span) {
        return;
      }
      clearTimeout(pendingToggle);
      const row = span.closest('.task');
      const editor = document.createElement('input');
      editor.type = 'text';
      editor.value = span.textContent;
      span.replaceWith(editor);
      editor.focus();

      let committed = false;
      const commit = async () => {
        if (committed) {
          return;
        }
        committed = true;
        try {
          const change = await request('PATCH', `/api/tasks/${row.dataset.id}`, { text: editor.value });
          applyChange(change, row.dataset.id);
        } catch (err) {
          editor.replaceWith(span);
          reportError(err);
        }
      };
      editor.addEventListener('keydown', (e) => {
        if (e.key === 'Enter') {
          commit();
        }
      });
      editor.addEventListener('blur', commit);
    });

    deleteAllBtn.addEventListener('click', async () => {
      if (!confirm(clearPrompt)) {
        return;
      }
      try {
        const change = await request('DELETE', '/api/tasks', { confirmed: true });
        if (change.changed) {
          list.innerHTML = '';
        }
        applyChange(change);
      } catch (err) {
        reportError(err);
      }
    });

    const timeEl = document.getElementById('time');
    const dateEl = document.getElementById('date');
    const weekdays = ['Dom', 'Lun', 'Mar', 'Mié', 'Jue', 'Vie', 'Sáb'];
    const months = ['Ene', 'Feb', 'Mar', 'Abr', 'May', 'Jun', 'Jul', 'Ago', 'Sep', 'Oct', 'Nov', 'Dic'];
    const pad = (n) => String(n).padStart(2, '0');

    const tick = () => {
      const now = new Date();
      timeEl.textContent = `${pad(now.getHours())}:${pad(now.getMinutes())}:${pad(now.getSeconds())}`;
      dateEl.textContent = `${weekdays[now.getDay()]}, ${now.getDate()} ${months[now.getMonth()]}`;
    };
    setInterval(tick, 1000);

    const cityEl = document.getElementById('city');
    const weatherEl = document.getElementById('weather');
    const weatherStatusEl = document.getElementById('weather-status');

    const loadWeather = async () => {
      setStatus(weatherStatusEl, '', 'info');
      try {
        const report = await request('GET', '/api/weather');
        weatherEl.textContent = `${report.temperature_c}°C, ${report.description} (feels ${report.feels_like_c}°C, ${report.humidity}% humidity, wind ${report.wind_kmph} km/h)`;
      } catch (err) {
        weatherEl.textContent = '--';
        setStatus(weatherStatusEl, err.message, 'error');
      }
    };

    cityEl.addEventListener('dblclick', () => {
      const editor = document.createElement('input');
      editor.type = 'text';
      editor.value = cityEl.textContent;
      cityEl.replaceWith(editor);
      editor.focus();

      let committed = false;
      const commit = async () => {
        if (committed) {
          return;
        }
        committed = true;
        try {
          const result = await request('PUT', '/api/weather/city', { city: editor.value });
          cityEl.textContent = result.city;
          setStatus(statusEl, result.warning, result.warning ? 'error' : 'info');
        } catch (err) {
          setStatus(weatherStatusEl, err.message, 'error');
        }
        editor.replaceWith(cityEl);
        loadWeather();
      };
      editor.addEventListener('keydown', (e) => {
        if (e.key === 'Enter') {
          commit();
        }
      });
      editor.addEventListener('blur', commit);
    });

    loadWeather();
  </script>
</body>
</html>
"#;
