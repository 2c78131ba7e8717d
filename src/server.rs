// region:    --- Imports
use crate::auction::commands::AuctionStore;
use crate::auction::repository::PostgresAuctionRepository;
use crate::config::{AuctionOptions, SearchOptions};
use crate::database::{DatabaseManager, Schema};
use crate::event_store::KafkaEventPublisher;
use crate::handlers::auction::AuctionState;
use crate::handlers::auth::AuthConfig;
use crate::handlers::search::SearchState;
use crate::handlers::{self, handle_health};
use crate::message_broker::KafkaManager;
use crate::scheduler::OutboxRelay;
use crate::search::consumer::{KafkaDeadLetterSink, SearchEventConsumer};
use crate::search::projector::SearchProjector;
use crate::search::repository::PostgresSearchRepository;
use crate::search::sync::{reconcile, AuctionServiceClient};
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

const EVENTS_TOPIC_PARTITIONS: i32 = 5;
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

// region:    --- Auction Service
pub async fn run_auction(opts: AuctionOptions) -> anyhow::Result<()> {
    // 데이터베이스 초기화
    let db_manager = Arc::new(
        DatabaseManager::connect(&opts.database_url)
            .await
            .context("데이터베이스 연결 실패")?,
    );
    db_manager
        .initialize_schema(Schema::Auction)
        .await
        .context("데이터베이스 초기화 실패")?;
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 초기화 및 토픽 생성
    let kafka_manager = KafkaManager::new(&opts.broker.kafka_brokers);
    kafka_manager
        .create_topic(&opts.broker.events_topic, EVENTS_TOPIC_PARTITIONS, 1)
        .await?;
    let producer = kafka_manager.producer()?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    let publisher = KafkaEventPublisher::new(
        db_manager.get_pool(),
        Arc::clone(&producer),
        &opts.broker.events_topic,
    );
    let repository = PostgresAuctionRepository::new(Arc::clone(&db_manager));
    let store = AuctionStore::new(Arc::new(repository), Arc::new(publisher));

    // 미발행 이벤트 재전송
    OutboxRelay::new(
        db_manager.get_pool(),
        producer,
        &opts.broker.events_topic,
        Duration::from_secs(opts.outbox_interval_secs.max(1)),
    )
    .start()
    .await;

    let state = AuctionState {
        store: Arc::new(store),
        auth: Arc::new(AuthConfig::new(&opts.jwt_secret)),
    };
    let routes_all = Router::new()
        .route("/health", get(handle_health))
        .merge(handlers::auction::routes(state));

    serve(opts.listen_addr, routes_all).await
}
// endregion: --- Auction Service

// region:    --- Search Service
pub async fn run_search(opts: SearchOptions) -> anyhow::Result<()> {
    let db_manager = DatabaseManager::connect(&opts.database_url)
        .await
        .context("데이터베이스 연결 실패")?;
    db_manager
        .initialize_schema(Schema::Search)
        .await
        .context("데이터베이스 초기화 실패")?;
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    let repository = Arc::new(PostgresSearchRepository::new(db_manager.get_pool()));
    let projector = Arc::new(SearchProjector::new(repository.clone()));

    // 경매 서비스와 초기 동기화
    let client = AuctionServiceClient::new(&opts.auction_service_url);
    let sync_projector = Arc::clone(&projector);
    let sync_interval = Duration::from_secs(opts.sync_retry_interval_secs.max(1));
    tokio::spawn(async move {
        if let Err(e) = reconcile(&sync_projector, &client, sync_interval).await {
            error!("{:<12} --> 경매 서비스 동기화 실패: {:?}", "Main", e);
        }
    });

    // 이벤트 소비 시작
    let kafka_manager = KafkaManager::new(&opts.broker.kafka_brokers);
    kafka_manager
        .create_topic(&opts.broker.events_topic, EVENTS_TOPIC_PARTITIONS, 1)
        .await?;
    kafka_manager
        .create_topic(&opts.dead_letter_topic, 1, 1)
        .await?;
    let dead_letters = KafkaDeadLetterSink::new(kafka_manager.producer()?, &opts.dead_letter_topic);
    let event_consumer = SearchEventConsumer::new(
        Arc::clone(&projector),
        kafka_manager.consumer(&opts.consumer_group)?,
        Arc::new(dead_letters),
        &opts.broker.events_topic,
        opts.retry_policy(),
    );
    tokio::spawn(async move {
        event_consumer.start().await;
    });

    let routes_all = Router::new()
        .route("/health", get(handle_health))
        .merge(handlers::search::routes(SearchState { repository }));

    serve(opts.listen_addr, routes_all).await
}
// endregion: --- Search Service

async fn serve(addr: SocketAddr, routes: Router) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = routes
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
