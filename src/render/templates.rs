//! Liquid sources for every page and fragment.
//!
//! Item text is always passed through `escape`. Values named `*_html` hold
//! fragments that were already rendered and are inserted as-is.

pub const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>To-do list</title>
  <script src="https://unpkg.com/htmx.org@1.9.10"></script>
  <script>
    // Error responses carry a #dialog fragment; htmx skips 4xx/5xx swaps.
    document.addEventListener("htmx:beforeSwap", function (evt) {
      if (evt.detail.xhr.status >= 400) {
        evt.detail.shouldSwap = false;
        var dialog = document.getElementById("dialog");
        if (dialog && evt.detail.serverResponse) {
          dialog.outerHTML = evt.detail.serverResponse;
          htmx.process(document.getElementById("dialog"));
        }
      }
    });
  </script>
{% if stylesheet %}  <link rel="stylesheet" href="/static/style.css">
{% endif %}</head>
<body>
  <main>
    <h1>To-do list</h1>
    <form hx-post="/item/" hx-target="#todo-list" hx-swap="beforeend" hx-on::after-request="this.reset()">
      <input type="text" name="text" placeholder="What needs doing?" required>
      <button type="submit">Add</button>
    </form>
    {{ list_html }}
    <div id="dialog"></div>
  </main>
</body>
</html>
"##;

pub const LIST: &str = r##"<ul id="todo-list">
{% for row in rows_html %}{{ row }}
{% endfor %}</ul>
"##;

pub const ITEM_TODO: &str = r##"<li id="item-{{ item.id }}" class="item item-todo">
  <span class="item-text">{{ item.text | escape }}</span>
  <button hx-get="/item/{{ item.id }}/edit" hx-target="#item-{{ item.id }}" hx-swap="outerHTML">Edit</button>
  <button hx-patch="/item/{{ item.id }}/done" hx-target="#item-{{ item.id }}" hx-swap="outerHTML">Done</button>
  <button hx-delete="/item/{{ item.id }}" hx-target="#todo-list" hx-swap="outerHTML">Delete</button>
</li>"##;

pub const ITEM_EDIT: &str = r##"<li id="item-{{ item.id }}" class="item item-edit">
  <form hx-patch="/item/{{ item.id }}/edit" hx-target="#item-{{ item.id }}" hx-swap="outerHTML">
    <input type="text" name="text" value="{{ item.text | escape }}" required autofocus>
    <button type="submit">Save</button>
    <button type="button" hx-patch="/item/{{ item.id }}/undo" hx-target="#item-{{ item.id }}" hx-swap="outerHTML">Cancel</button>
  </form>
</li>"##;

pub const ITEM_DONE: &str = r##"<li id="item-{{ item.id }}" class="item item-done">
  <s class="item-text">{{ item.text | escape }}</s>
  <button hx-patch="/item/{{ item.id }}/undo" hx-target="#item-{{ item.id }}" hx-swap="outerHTML">Undo</button>
  <button hx-delete="/item/{{ item.id }}" hx-target="#todo-list" hx-swap="outerHTML">Delete</button>
</li>"##;

pub const ITEM_ERROR: &str = r##"<div id="dialog" class="dialog dialog-warning" role="alert" data-error="{{ error_type }}" hx-swap-oob="true">
  <p>{{ message | escape }}</p>
  <button onclick="location.reload()">Reload list</button>
</div>
"##;

pub const SERVER_ERROR: &str = r##"<div id="dialog" class="dialog dialog-error" role="alert" data-error="server_error" hx-swap-oob="true">
  <p>Something went wrong on our side. Please try again.</p>
</div>
"##;

pub const ADMIN: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>List items - admin</title>
</head>
<body>
  <h1>List items</h1>
  <p>{{ items.size }} item(s)</p>
  <table>
    <thead><tr><th>id</th><th>text</th><th>state</th><th></th></tr></thead>
    <tbody>
{% for item in items %}      <tr><td>{{ item.id }}</td><td>{{ item.text | escape }}</td><td>{{ item.state }}</td><td>
        <form method="post" action="/admin/items/{{ item.id }}/state">
          <select name="state">{% for state in states %}<option value="{{ state }}"{% if state == item.state %} selected{% endif %}>{{ state }}</option>{% endfor %}</select>
          <button type="submit">Set</button>
        </form>
        <form method="post" action="/admin/items/{{ item.id }}/delete">
          <button type="submit">Delete</button>
        </form>
      </td></tr>
{% endfor %}    </tbody>
  </table>
</body>
</html>
"##;
