use std::sync::Arc;

use awesome_log::config::{with_caller, with_color, with_file_rotation, with_level};
use awesome_log::{info, Logger, Registry, Severity};

/// Demo services, each logging to its own file under `logs/`.
struct UserService {
    log: Arc<Logger>,
}

struct OrderService {
    log: Arc<Logger>,
    users: UserService,
}

impl UserService {
    fn new(registry: &Registry) -> awesome_log::Result<Self> {
        Ok(Self {
            log: registry.get("user-service")?,
        })
    }

    fn register(&self, username: &str) -> String {
        let id = format!("u_{username}");
        info!(self.log; "user registered", "user_id" => id.as_str(), "username" => username);
        id
    }
}

impl OrderService {
    fn new(registry: &Registry, users: UserService) -> awesome_log::Result<Self> {
        Ok(Self {
            log: registry.get("order-service")?,
            users,
        })
    }

    fn create_order(&self, username: &str, amount: f64) {
        let user_id = self.users.register(username);
        info!(self.log; "order created", "user_id" => user_id.as_str(), "amount" => amount);
        if amount > 1000.0 {
            awesome_log::log!(
                self.log; Severity::Warn, format!("large order for {user_id}"),
                "limit" => serde_json::json!({ "amount": 1000.0, "currency": "EUR" }),
            );
        }
    }
}

fn main() -> awesome_log::Result<()> {
    awesome_log::init([
        with_level("debug"),
        with_color(true),
        with_caller(true),
        with_file_rotation("logs/app.log", 10, 7, 5, true),
    ])?;
    awesome_log::install_tracing()?;

    info!("demo starting");

    let registry = awesome_log::facade::global().registry();
    let orders = OrderService::new(registry, UserService::new(registry)?)?;
    orders.create_order("alice", 99.5);
    orders.create_order("bob", 2500.0);

    tracing::debug!(loggers = ?registry.names(), "demo finished");
    awesome_log::sync()
}
