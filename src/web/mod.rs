//! HTTP front end.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │ Browser  │ ───────> │  server.rs  (axum Router, ServerConfig)      │
//! │          │ <─────── │    ├─ routes.rs  (handlers, AppState)        │
//! └──────────┘   HTML   │    │     │ parse_form_fields() → Document   │
//!                       │    │     │ DocumentStore read / write       │
//!                       │    │     v                                  │
//!                       │    ├─ render.rs  (HTML pages)                │
//!                       │    └─ assets.rs  (embedded CSS / JS)         │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! | Route                               | Handler                      |
//! |-------------------------------------|------------------------------|
//! | `GET /forms/{name}`                 | form page                    |
//! | `POST /forms/{name}`                | validate and store           |
//! | `GET /forms/{name}/template.csv`    | CSV template download        |
//! | `POST /forms/{name}/upload`         | bulk CSV insert (JSON reply) |
//! | `GET /tables/{name}`                | submissions table            |
//! | `GET /dashboards/{name}?y=`         | line chart                   |
//! | `GET /api/dashboards/{name}?y=`     | chart figure as JSON         |
//! | `GET /api/forms/{name}/documents`   | stored documents as JSON     |

pub mod assets;
pub mod render;
pub mod routes;
pub mod server;

pub use routes::{AppState, SharedState};
pub use server::{ServerConfig, build_router, start_server};
