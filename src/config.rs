use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_pool_size: u32,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: String,
    pub mqtt_keepalive_secs: u64,
    pub broker_connect_timeout_secs: u64,
    pub queue_capacity: usize,
    pub http_host: String,
    pub http_port: u16,
    pub chart_max_points: usize,
    pub latest_window_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("MTS_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("MTS_DATABASE_URL or DATABASE_URL is required")?;

        let mqtt_host = env::var("MTS_MQTT_HOST")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("MTS_MQTT_HOST is required (telemetry broker endpoint)")?;
        let mqtt_port = env::var("MTS_MQTT_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(1883);
        let mqtt_username = env::var("MTS_MQTT_USERNAME").ok();
        let mqtt_password = env::var("MTS_MQTT_PASSWORD").ok();
        let mqtt_topic_prefix =
            env::var("MTS_MQTT_TOPIC_PREFIX").unwrap_or_else(|_| "env".to_string());
        let mqtt_keepalive_secs = env::var("MTS_MQTT_KEEPALIVE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        let broker_connect_timeout_secs = env::var("MTS_BROKER_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let queue_capacity = env::var("MTS_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v != 0)
            .unwrap_or(4096);
        let db_pool_size = env::var("MTS_DB_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let http_host = env::var("MTS_HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = env::var("MTS_HTTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let chart_max_points = env::var("MTS_CHART_MAX_POINTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v >= 2)
            .unwrap_or(500);
        let latest_window_hours = env::var("MTS_LATEST_WINDOW_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(24);

        Ok(Self {
            database_url,
            db_pool_size,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_topic_prefix,
            mqtt_keepalive_secs,
            broker_connect_timeout_secs,
            queue_capacity,
            http_host,
            http_port,
            chart_max_points,
            latest_window_hours,
        })
    }

    pub fn mqtt_keepalive(&self) -> Duration {
        Duration::from_secs(self.mqtt_keepalive_secs)
    }

    pub fn broker_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.broker_connect_timeout_secs)
    }
}
