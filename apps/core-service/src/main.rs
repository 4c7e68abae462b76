//! # Core Service サーバー
//!
//! 承認ワークフローエンジンを HTTP で提供する内部サービス。
//!
//! ## 役割
//!
//! - **ワークフロー実行**: インスタンスの作成、承認アクションの適用
//! - **参照**: 承認可能者、監査履歴、優先順の承認待ち一覧
//! - **イベント配信**: コミット済みのワークフローイベントを配信先へ渡す
//!
//! ドキュメントの保存やユーザー管理は行わない。承認者・ドキュメントは
//! 呼び出し側が管理する不透明な参照として扱う。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | No | ポート番号（デフォルト: `3001`） |
//! | `LOCK_TIMEOUT_MS` | No | インスタンスロックの最大待ち時間（デフォルト: `2000`） |
//! | `WORKFLOW_TEMPLATES_PATH` | No | ワークフローテンプレート JSON のパス |
//! | `PERMITTED_ACTORS` | No | 操作を許可するアクター（カンマ区切り、未設定で全員許可） |
//! | `EVENT_SINK_BACKEND` | No | `noop`（デフォルト）または `channel` |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p shoninflow-core-service
//!
//! # 本番環境
//! LOG_FORMAT=json WORKFLOW_TEMPLATES_PATH=./demos/templates.json \
//!   cargo run -p shoninflow-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use shoninflow_core_service::{
    app_builder,
    config::CoreConfig,
    handler::WorkflowState,
    usecase::WorkflowUseCaseImpl,
};
use shoninflow_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("core-service"));

    let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let deps = app_builder::build_deps(&config).context("依存コンポーネントの初期化に失敗しました")?;
    let usecase = WorkflowUseCaseImpl::new(deps, config.lock_timeout);
    let state = Arc::new(WorkflowState {
        usecase: Arc::new(usecase),
    });

    let app = app_builder::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
