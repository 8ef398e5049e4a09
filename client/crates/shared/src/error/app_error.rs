//! Application Error - Unified error type surfaced to the UI layer
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// UI 向け統一エラー型
///
/// セッション層・セキュリティ層のエラーは最終的にこの型へ変換されます。
/// ビルダーパターンを使用してエラーを構築できます。
///
/// ## Fields
/// * `kind` - エラーの分類
/// * `message` - ユーザー向けのエラーメッセージ
/// * `action` - ユーザーが取るべきアクション（オプション）
/// * `source` - 元のエラー（オプション、デバッグ用）
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::RateLimited, "Upload limit reached")
///     .with_action("Wait a minute before uploading again");
/// assert_eq!(err.kind(), ErrorKind::RateLimited);
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// アプリケーション結果型エイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 種別ごとのショートカットコンストラクタを生成
macro_rules! kind_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("`ErrorKind::", stringify!($kind), "` のエラーを作成")]
            #[inline]
            pub fn $name(message: impl Into<Cow<'static, str>>) -> Self {
                Self::new(ErrorKind::$kind, message)
            }
        )*
    };
}

impl AppError {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// 新しいエラーを作成
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            source: None,
        }
    }

    kind_constructors! {
        invalid_input => InvalidInput,
        unauthorized => Unauthorized,
        rate_limited => RateLimited,
        configuration_gap => ConfigurationGap,
        transient_auth => TransientAuth,
        storage_failure => StorageFailure,
        internal => Internal,
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// ユーザー向けアクションを設定
    #[inline]
    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// 元のエラーを設定（デバッグ用）
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// UI 表示用の文字列を生成
    ///
    /// `detailed` が `false` の場合、内部エラーのメッセージと原因は隠され、
    /// 種別の定型文だけが返ります（本番環境向け）。
    /// `true` の場合は原因チェーンまで含めます（開発環境向け）。
    pub fn render(&self, detailed: bool) -> String {
        let mut out = if detailed || !self.kind.is_internal() {
            self.message.to_string()
        } else {
            self.kind.as_str().to_string()
        };

        if detailed {
            let mut cause = self.source();
            while let Some(err) = cause {
                out.push_str(&format!(": {err}"));
                cause = err.source();
            }
        }

        if let Some(action) = &self.action {
            out.push_str(&format!(" ({action})"));
        }
        out
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(action) = &self.action {
            builder.field("action", action);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " (Action: {})", action)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

// ============================================================================
// Result extension traits
// ============================================================================

/// `Result<T, E>` を `AppResult<T>` に変換するための拡張トレイト
pub trait ResultExt<T, E> {
    /// エラーを `AppError` に変換し、指定した種別とメッセージでラップ
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static,
    {
        self.map_err(|e| AppError::new(kind, message).with_source(e))
    }
}

/// `Option<T>` を `AppResult<T>` に変換するための拡張トレイト
pub trait OptionExt<T> {
    /// `None` の場合に `AppError` を返す
    fn ok_or_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>;

    /// `None` の場合に未ログインエラーを返す
    fn ok_or_unauthorized(self, message: impl Into<Cow<'static, str>>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_else(|| AppError::new(kind, message))
    }

    fn ok_or_unauthorized(self, message: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_app_err(ErrorKind::Unauthorized, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::InvalidInput, "Bad email");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.message(), "Bad email");
        assert!(err.action().is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(AppError::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(AppError::unauthorized("x").kind(), ErrorKind::Unauthorized);
        assert_eq!(AppError::rate_limited("x").kind(), ErrorKind::RateLimited);
        assert_eq!(
            AppError::configuration_gap("x").kind(),
            ErrorKind::ConfigurationGap
        );
        assert_eq!(AppError::transient_auth("x").kind(), ErrorKind::TransientAuth);
        assert_eq!(AppError::storage_failure("x").kind(), ErrorKind::StorageFailure);
        assert_eq!(AppError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_display() {
        let err = AppError::unauthorized("Session expired");
        assert_eq!(err.to_string(), "[Not signed in] Session expired");

        let err = AppError::rate_limited("Slow down").with_action("Retry later");
        assert!(err.to_string().contains("Action: Retry later"));
    }

    #[test]
    fn test_render_hides_internal_details() {
        let io_err = std::io::Error::other("disk quota exceeded");
        let err = AppError::storage_failure("Failed to write token bundle").with_source(io_err);

        let public = err.render(false);
        assert_eq!(public, "Local storage unavailable");

        let detailed = err.render(true);
        assert!(detailed.contains("Failed to write token bundle"));
        assert!(detailed.contains("disk quota exceeded"));
    }

    #[test]
    fn test_render_keeps_user_facing_message() {
        let err = AppError::invalid_input("Title is too long").with_action("Shorten it");
        assert_eq!(err.render(false), "Title is too long (Shorten it)");
    }

    #[test]
    fn test_result_ext() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::other("boom"));
        let app_result = result.map_app_err(ErrorKind::StorageFailure, "Write failed");
        let err = app_result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_unauthorized("No session");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthorized);

        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_unauthorized("No session").unwrap(), 42);
    }
}
