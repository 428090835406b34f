use std::env;
use std::time::Duration;
use tokio::time;

use mentor_booking::database::Database;
use mentor_booking::models::PaymentConfig;
use mentor_booking::payments::PAYMENT_SERVICE_HOST_ENV;
use mentor_booking::store::{BookingStore, PgBookingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting mentor booking service with PostgreSQL...");

    // Инициализация базы данных
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::new(&database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    // Настройки платёжного сервиса
    let payment_config = PaymentConfig {
        service_host: env::var(PAYMENT_SERVICE_HOST_ENV)?,
        currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
    };
    log::info!(
        "💳 Payment service: {} ({})",
        payment_config.service_host,
        payment_config.currency
    );

    let store = PgBookingStore::new(db);

    // Фоновая задача: снимаем брони с истекшим сроком оплаты
    log::info!("🚀 Booking service ready, sweeping stale payment holds every 60s");
    let mut interval = time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;

        match store.expire_stale_holds().await {
            Ok(0) => {}
            Ok(expired) => log::info!("⏰ Expired {} stale payment holds", expired),
            Err(e) => log::error!("Error expiring stale holds: {}", e),
        }
    }
}
