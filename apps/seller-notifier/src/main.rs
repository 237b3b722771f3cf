use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use market_common::protocol::{OrderNew, OrderStatusChanged};
use market_common::{Envelope, EventName, Room};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seller_notifier::config::Config;
use seller_notifier::escalator::Escalator;
use seller_notifier::notifier::LogNotifier;
use seller_notifier::store::{FileMarkerStore, MarkerStore, MemoryMarkerStore};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    Disconnected,
    Shutdown,
}

#[tokio::main]
async fn main() {
    // Created once so a Ctrl-C is not lost while the loop is busy elsewhere.
    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let markers: Arc<dyn MarkerStore> = match &config.store_path {
        Some(path) => {
            let store = FileMarkerStore::open(path)
                .await
                .expect("failed to open reminder store");
            tracing::info!(path = %store.path().display(), "reminder markers persisted to file");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REMINDER_STORE_PATH not set, reminder markers will not persist");
            Arc::new(MemoryMarkerStore::new())
        }
    };
    let notifier = LogNotifier::new(config.desktop_notifications);
    let mut escalator = Escalator::new(markers, Arc::new(notifier));

    let mut ticker = time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stdin = Some(BufReader::new(tokio::io::stdin()).lines());

    loop {
        let mut socket = match tokio_tungstenite::connect_async(config.socket_url()).await {
            Ok((socket, _)) => socket,
            Err(tungstenite::Error::Http(resp)) if resp.status() == 401 => {
                tracing::error!("gateway rejected MARKET_TOKEN");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %config.ws_url, "gateway connect failed");
                if wait_or_shutdown(config.reconnect_delay, &mut shutdown).await {
                    tracing::info!("shutting down");
                    return;
                }
                continue;
            }
        };
        tracing::info!(url = %config.ws_url, "connected to gateway");

        match run_session(
            &mut socket,
            &mut escalator,
            &mut ticker,
            &mut stdin,
            &mut shutdown,
        )
        .await
        {
            SessionEnd::Shutdown => {
                let _ = socket.close(None).await;
                tracing::info!("shutting down");
                return;
            }
            SessionEnd::Disconnected => {
                tracing::warn!("gateway connection lost, reconnecting");
                if wait_or_shutdown(config.reconnect_delay, &mut shutdown).await {
                    tracing::info!("shutting down");
                    return;
                }
            }
        }
    }
}

/// Sleep for `delay`. Returns `true` if shutdown was requested meanwhile.
async fn wait_or_shutdown<S: Future + Unpin>(delay: Duration, shutdown: &mut S) -> bool {
    tokio::select! {
        _ = time::sleep(delay) => false,
        _ = &mut *shutdown => true,
    }
}

async fn run_session<S: Future + Unpin>(
    socket: &mut Socket,
    escalator: &mut Escalator,
    ticker: &mut Interval,
    stdin: &mut Option<Lines<BufReader<Stdin>>>,
    shutdown: &mut S,
) -> SessionEnd {
    loop {
        tokio::select! {
            msg = socket.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_frame(escalator, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Disconnected,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "socket read error");
                    return SessionEnd::Disconnected;
                }
                Some(Ok(_)) => {}
            },

            _ = ticker.tick() => {
                for reminder in escalator.tick(Utc::now()).await {
                    tracing::info!(id = %reminder.id, message = %reminder.message, "reminder");
                }
            }

            line = next_command(stdin) => match line {
                Some(line) => handle_command(escalator, &line).await,
                None => *stdin = None,
            },

            _ = &mut *shutdown => return SessionEnd::Shutdown,
        }
    }
}

/// Next line from stdin, or pending forever once stdin is closed.
async fn next_command(stdin: &mut Option<Lines<BufReader<Stdin>>>) -> Option<String> {
    match stdin {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => std::future::pending().await,
    }
}

async fn handle_command(escalator: &mut Escalator, line: &str) {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("view"), Some(order_id)) => {
            if escalator.view(order_id).await {
                tracing::info!(%order_id, "order viewed");
            }
        }
        (Some("dismiss"), Some(order_id)) => {
            if escalator.dismiss(order_id).await {
                tracing::info!(%order_id, "order dismissed");
            }
        }
        (Some("list"), None) => {
            for n in escalator.notifications() {
                tracing::info!(id = %n.id, order_id = %n.order_id, message = %n.message, "card");
            }
        }
        (None, _) => {}
        _ => tracing::warn!(%line, "commands: view <orderId> | dismiss <orderId> | list"),
    }
}

async fn handle_frame(escalator: &mut Escalator, text: &str) {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring undecodable frame");
            return;
        }
    };

    match envelope.event.as_str() {
        EventName::ORDER_NEW => match envelope.payload::<OrderNew>() {
            Ok(order) => {
                tracing::info!(order_id = %order.order_id, message = %order.message, "new order");
                escalator.on_order_new(&order, Utc::now());
            }
            Err(e) => tracing::warn!(error = %e, "malformed order:new"),
        },
        EventName::ORDER_STATUS_CHANGED => match envelope.payload::<OrderStatusChanged>() {
            Ok(change) => {
                tracing::info!(
                    order_id = %change.order_id,
                    status = %change.status.as_str(),
                    "order status changed"
                );
                escalator.on_status_changed(&change).await;
            }
            Err(e) => tracing::warn!(error = %e, "malformed order:status_changed"),
        },
        EventName::CONNECTED => {
            let rooms: Vec<Room> = envelope.data["rooms"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|r| r.as_str().and_then(Room::parse))
                .collect();
            if !rooms.iter().any(|r| matches!(r, Room::Seller(_))) {
                tracing::warn!("connected without a seller room; order notifications will not arrive");
            }
            tracing::info!(rooms = rooms.len(), "gateway session ready");
        }
        other => tracing::info!(event = %other, data = %envelope.data, "notification"),
    }
}
