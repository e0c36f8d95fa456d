//! WebSocket Live Readings
//!
//! Dashboards connect to `/ws` and subscribe to topics:
//! - `readings.latest` - pushed whenever a poll brings a newer reading
//! - `readings.*` - every readings topic
//! - `system` - poller failures and recoveries
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['readings.latest']}));
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, SystemEvent, WsEvent, TOPIC_LATEST, TOPIC_SYSTEM};
