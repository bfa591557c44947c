//! Tracing setup
//!
//! 라이브러리는 `tracing` 매크로만 사용하고, 구독자 설치는 호스트
//! 애플리케이션(또는 테스트)이 이 함수로 합니다.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 기본 tracing 구독자 설치
///
/// `RUST_LOG`가 설정되어 있으면 그 필터를, 아니면 `level`을 사용합니다.
/// 이미 구독자가 설치되어 있으면 false를 반환합니다.
pub fn init_tracing(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
