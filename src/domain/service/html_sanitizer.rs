/// HtmlSanitizer はメール HTML 本文の無害化を表す。
///
/// `allow_list` はタググループ名または個別タグ名、`deny_list` は許可対象からも除くタグ名。
#[cfg_attr(test, mockall::automock)]
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str, allow_list: &[String], deny_list: &[String]) -> String;
}
