// region:    --- Imports
use clap::{Args, Parser};
use std::net::SocketAddr;
use std::time::Duration;

// endregion: --- Imports

const DEFAULT_AUCTION_LISTEN_ADDR: &str = "0.0.0.0:7001";
const DEFAULT_SEARCH_LISTEN_ADDR: &str = "0.0.0.0:7002";
const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";

/// 이벤트 토픽
pub const AUCTION_EVENTS_TOPIC: &str = "auction-events";
/// 프로젝션에 반복 실패한 이벤트가 쌓이는 토픽
pub const DEAD_LETTER_TOPIC: &str = "auction-events-dead-letter";

// region:    --- Options
#[derive(Parser, Debug)]
#[command(name = "auction-platform")]
#[command(about = "Auction and search microservices")]
#[command(version)]
pub enum Options {
    /// 경매 서비스 실행
    Auction(AuctionOptions),
    /// 검색 서비스 실행
    Search(SearchOptions),
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Broker Options")]
pub struct BrokerOptions {
    /// Kafka bootstrap servers
    #[arg(long = "kafka-brokers")]
    #[arg(env = "KAFKA_BROKERS")]
    #[arg(default_value = DEFAULT_KAFKA_BROKERS)]
    pub kafka_brokers: String,

    #[arg(long = "events-topic")]
    #[arg(env = "EVENTS_TOPIC")]
    #[arg(default_value = AUCTION_EVENTS_TOPIC)]
    pub events_topic: String,
}

#[derive(Args, Clone, Debug)]
pub struct AuctionOptions {
    #[arg(long = "listen-addr")]
    #[arg(env = "LISTEN_ADDR")]
    #[arg(default_value = DEFAULT_AUCTION_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// HS256 bearer token 검증용 공유 키
    #[arg(long = "jwt-secret")]
    #[arg(env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// 미발행 이벤트 재전송 주기(초)
    #[arg(long = "outbox-interval-secs")]
    #[arg(env = "OUTBOX_INTERVAL_SECS")]
    #[arg(default_value_t = 5)]
    pub outbox_interval_secs: u64,

    #[command(flatten)]
    pub broker: BrokerOptions,
}

#[derive(Args, Clone, Debug)]
pub struct SearchOptions {
    #[arg(long = "listen-addr")]
    #[arg(env = "LISTEN_ADDR")]
    #[arg(default_value = DEFAULT_SEARCH_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// 초기 동기화에 사용할 경매 서비스 주소
    #[arg(long = "auction-service-url")]
    #[arg(env = "AUCTION_SERVICE_URL")]
    #[arg(default_value = "http://localhost:7001")]
    pub auction_service_url: String,

    #[arg(long = "consumer-group")]
    #[arg(env = "CONSUMER_GROUP")]
    #[arg(default_value = "search")]
    pub consumer_group: String,

    #[arg(long = "dead-letter-topic")]
    #[arg(env = "DEAD_LETTER_TOPIC")]
    #[arg(default_value = DEAD_LETTER_TOPIC)]
    pub dead_letter_topic: String,

    /// 이벤트 처리 재시도 횟수
    #[arg(long = "retry-limit")]
    #[arg(env = "CONSUMER_RETRY_LIMIT")]
    #[arg(default_value_t = 5)]
    pub retry_limit: u32,

    #[arg(long = "retry-interval-ms")]
    #[arg(env = "CONSUMER_RETRY_INTERVAL_MS")]
    #[arg(default_value_t = 500)]
    pub retry_interval_ms: u64,

    /// 경매 서비스 동기화 재시도 간격(초), 무제한 재시도
    #[arg(long = "sync-retry-interval-secs")]
    #[arg(env = "SYNC_RETRY_INTERVAL_SECS")]
    #[arg(default_value_t = 3)]
    pub sync_retry_interval_secs: u64,

    #[command(flatten)]
    pub broker: BrokerOptions,
}

impl SearchOptions {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_limit.max(1),
            interval: Duration::from_millis(self.retry_interval_ms),
        }
    }
}

// endregion: --- Options

// region:    --- Retry Policy
/// 고정 간격 재시도 정책
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_millis(500),
        }
    }
}
// endregion: --- Retry Policy
