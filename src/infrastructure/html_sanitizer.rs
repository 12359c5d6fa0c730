use std::collections::BTreeSet;

use crate::domain::service::HtmlSanitizer;

const FORMATTING: &[&str] = &[
    "b", "big", "br", "code", "del", "em", "font", "i", "ins", "o", "s", "small", "span",
    "strike", "strong", "sub", "sup", "tt", "u",
];
const BLOCKS: &[&str] = &[
    "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "ul",
];
const TABLES: &[&str] = &[
    "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
];
const LINK_ATTRIBUTES: &[&str] = &["href", "title"];
const IMAGE_ATTRIBUTES: &[&str] = &["alt", "border", "height", "src", "title", "width"];
const STYLE_ATTRIBUTES: &[&str] = &["style"];
const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// 内容ごと除去するタグ。許可リストに個別指定されても許可しない。
const CONTENT_STRIPPED: &[&str] = &["script", "style"];

/// AmmoniaSanitizer は ammonia でメール HTML を許可リスト方式で無害化する。
///
/// 許可リストの要素は `formatting` `blocks` `links` `tables` `images` `styles` の
/// グループ名か個別タグ名。拒否リストのタグは許可リストに含まれていても除去される。
#[derive(Debug, Default, Clone, Copy)]
pub struct AmmoniaSanitizer;

impl AmmoniaSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlSanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str, allow_list: &[String], deny_list: &[String]) -> String {
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        let mut allow_style = false;
        for entry in allow_list {
            match entry.as_str() {
                "formatting" => tags.extend(FORMATTING),
                "blocks" => tags.extend(BLOCKS),
                "links" => {
                    tags.insert("a");
                }
                "tables" => tags.extend(TABLES),
                "images" => {
                    tags.insert("img");
                }
                "styles" => allow_style = true,
                tag => {
                    tags.insert(tag);
                }
            }
        }
        tags.retain(|tag| {
            !CONTENT_STRIPPED.contains(tag) && !deny_list.iter().any(|d| d.eq_ignore_ascii_case(tag))
        });

        let mut builder = ammonia::Builder::empty();
        builder
            .clean_content_tags(CONTENT_STRIPPED.iter().copied().collect())
            .add_tags(tags.iter().copied());
        if tags.contains("a") || tags.contains("img") {
            builder.add_url_schemes(URL_SCHEMES.iter());
        }
        if tags.contains("a") {
            builder.add_tag_attributes("a", LINK_ATTRIBUTES.iter());
        }
        if tags.contains("img") {
            builder.add_tag_attributes("img", IMAGE_ATTRIBUTES.iter());
        }
        if allow_style {
            builder.add_generic_attributes(STYLE_ATTRIBUTES.iter());
        }
        builder.clean(html).to_string()
    }
}
