//! Error types for Plexus
//!
//! 플러그인 프레임워크의 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Plexus 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 플러그인 정의 관련
    // ========================================================================
    #[error("The \"{plugin_id}\" plugin does not exist (plugin type: {plugin_type})")]
    PluginNotFound {
        plugin_id: String,
        plugin_type: String,
    },

    #[error("Invalid plugin definition '{plugin_id}': {reason}")]
    InvalidDefinition { plugin_id: String, reason: String },

    #[error("Plugin error: {0}")]
    Plugin(String),

    // ========================================================================
    // 인스턴스 생성 관련
    // ========================================================================
    #[error("Plugin '{plugin_id}' specifies a non-existent class '{class}'")]
    ClassNotFound { plugin_id: String, class: String },

    #[error("Failed to instantiate plugin '{plugin_id}': {source}")]
    Instantiation {
        plugin_id: String,
        #[source]
        source: anyhow::Error,
    },

    // ========================================================================
    // 서비스 컨테이너 관련
    // ========================================================================
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service type mismatch: {0}")]
    ServiceType(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 정의를 찾지 못한 에러인지 확인
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PluginNotFound { .. })
    }

    /// 플러그인 계열 에러인지 확인 (정의/클래스/인스턴스 생성)
    pub fn is_plugin_error(&self) -> bool {
        matches!(
            self,
            Error::PluginNotFound { .. }
                | Error::InvalidDefinition { .. }
                | Error::Plugin(_)
                | Error::ClassNotFound { .. }
                | Error::Instantiation { .. }
        )
    }

    /// PluginNotFound 에러 생성 헬퍼
    pub fn plugin_not_found(plugin_id: impl Into<String>, plugin_type: impl Into<String>) -> Self {
        Error::PluginNotFound {
            plugin_id: plugin_id.into(),
            plugin_type: plugin_type.into(),
        }
    }

    /// InvalidDefinition 에러 생성 헬퍼
    pub fn invalid_definition(plugin_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidDefinition {
            plugin_id: plugin_id.into(),
            reason: reason.into(),
        }
    }

    /// Instantiation 에러 생성 헬퍼
    pub fn instantiation(plugin_id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Error::Instantiation {
            plugin_id: plugin_id.into(),
            source: source.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
