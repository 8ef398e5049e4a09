//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by the session and security crates.

use serde::Serialize;

/// エラー種別の列挙体
///
/// クライアント側のセキュリティ/セッション層で発生するエラーの分類です。
/// UI はこの分類だけを見て、再試行・再ログイン・入力修正のどれを促すかを決めます。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::TransientAuth;
/// assert!(kind.is_retryable());
/// assert_eq!(kind.as_str(), "Authentication service unavailable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 入力値が検証ルールに違反している
    InvalidInput,
    /// 有効なセッションがない（未ログイン/期限切れ）
    Unauthorized,
    /// クライアント側レート制限に到達
    RateLimited,
    /// 設定に存在しないカテゴリ/パターンが指定された
    ConfigurationGap,
    /// 認証サービスとの通信が一時的に失敗した
    TransientAuth,
    /// 永続ストレージの読み書きに失敗した
    StorageFailure,
    /// 想定外の内部エラー
    Internal,
}

impl ErrorKind {
    /// ユーザー向けの文字列表現を取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::RateLimited.as_str(), "Too many requests");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Invalid input",
            ErrorKind::Unauthorized => "Not signed in",
            ErrorKind::RateLimited => "Too many requests",
            ErrorKind::ConfigurationGap => "Unknown configuration entry",
            ErrorKind::TransientAuth => "Authentication service unavailable",
            ErrorKind::StorageFailure => "Local storage unavailable",
            ErrorKind::Internal => "Internal error",
        }
    }

    /// 再試行で解消する可能性があるか
    ///
    /// 通信系・ストレージ系・レート制限は時間をおけば成功し得るため `true` を返します。
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransientAuth | ErrorKind::StorageFailure | ErrorKind::RateLimited
        )
    }

    /// 内部事情に由来するエラーかどうか
    ///
    /// `true` の場合、本番環境では詳細をユーザーに見せてはいけません。
    #[inline]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransientAuth | ErrorKind::StorageFailure | ErrorKind::Internal
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
