use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Quoted literals (possibly unterminated) or a `:name` placeholder. A quote left
// open swallows the rest of the template, placeholders included.
const TOKEN_PATTERN: &str = r#"'[^']*(?:'|$)|"[^"]*(?:"|$)|:([_\p{XID_Start}]\p{XID_Continue}*)"#;

static TOKENS: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(TOKEN_PATTERN));

/// A template with its named placeholders rewritten to positional `?` markers.
///
/// Produced once by [`build_query`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    sql: String,
    order: Vec<String>,
    indexes: HashMap<String, Vec<usize>>,
}

impl ParsedQuery {
    /// The positional SQL handed to the driver.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Lower-cased placeholder name for every positional marker, in order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// 1-based positions recorded for `name` (case-insensitive). Empty when the
    /// template never mentions it.
    pub fn indexes(&self, name: &str) -> &[usize] {
        self.indexes
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of positional markers in [`sql`](Self::sql).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Converts named placeholders (`:name`) to positional placeholders (`?`).
///
/// Text inside single or double quotes is copied verbatim. A colon that is not
/// followed by an identifier start is left alone. Names are lower-cased; every
/// occurrence gets its own position, numbered from 1.
///
/// # Examples
///
/// ```
/// use sqlx_named_mapper::builder::build_query;
///
/// let query = build_query("SELECT * FROM device WHERE id = :id OR parent = :Id")?;
/// assert_eq!(query.sql(), "SELECT * FROM device WHERE id = ? OR parent = ?");
/// assert_eq!(query.indexes("ID"), &[1, 2]);
/// # Ok::<(), sqlx_named_mapper::Error>(())
/// ```
pub fn build_query(template: &str) -> crate::Result<ParsedQuery> {
    let regex = LazyLock::force(&TOKENS).as_ref().map_err(Clone::clone)?;
    let template = template.trim();

    let mut sql = String::with_capacity(template.len());
    let mut order = Vec::new();
    let mut indexes: HashMap<String, Vec<usize>> = HashMap::new();
    let mut copied = 0;

    for captures in regex.captures_iter(template) {
        // Quoted literals fall through and are copied with the surrounding text.
        let (Some(span), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        sql.push_str(&template[copied..span.start()]);
        sql.push('?');
        copied = span.end();

        let name = name.as_str().to_lowercase();
        order.push(name.clone());
        indexes.entry(name).or_default().push(order.len());
    }
    sql.push_str(&template[copied..]);

    Ok(ParsedQuery {
        sql,
        order,
        indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_single_param() {
        let result = build_query("SELECT * FROM users WHERE id = :id").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM users WHERE id = ?");
        assert_eq!(result.indexes("id"), &[1]);
    }

    #[test]
    fn test_build_query_multiple_params() {
        let result = build_query("SELECT * FROM users WHERE id = :id AND name = :name").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
        assert_eq!(result.order(), &["id", "name"]);
    }

    #[test]
    fn test_build_query_repeated_params() {
        let result = build_query("SELECT * FROM users WHERE id = :id OR user_id = :id").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM users WHERE id = ? OR user_id = ?");
        assert_eq!(result.indexes("id"), &[1, 2]);
    }

    #[test]
    fn test_build_query_no_params() {
        let result = build_query("SELECT * FROM users").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM users");
        assert!(result.is_empty());
    }

    #[test]
    fn test_build_query_with_underscores() {
        let result = build_query("SELECT * FROM users WHERE user_id = :user_id").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM users WHERE user_id = ?");
        assert_eq!(result.indexes("USER_ID"), &[1]);
    }

    #[test]
    fn test_build_query_names_are_case_insensitive() {
        let result = build_query("UPDATE device SET name = :Name WHERE id = :deviceId AND name <> :name")
            .unwrap();
        assert_eq!(result.indexes("name"), &[1, 3]);
        assert_eq!(result.indexes("DEVICEID"), &[2]);
        assert_eq!(result.order(), &["name", "deviceid", "name"]);
    }

    #[test]
    fn test_build_query_ignores_quoted_text() {
        let result =
            build_query(r#"SELECT ':skip', "col:umn" FROM t WHERE a = :a AND b = 'x :y' AND c = :c"#)
                .unwrap();
        assert_eq!(
            result.sql(),
            r#"SELECT ':skip', "col:umn" FROM t WHERE a = ? AND b = 'x :y' AND c = ?"#
        );
        assert_eq!(result.order(), &["a", "c"]);
        assert!(result.indexes("skip").is_empty());
        assert!(result.indexes("y").is_empty());
    }

    #[test]
    fn test_build_query_quote_inside_other_quote() {
        let result = build_query(r#"SELECT "it's" FROM t WHERE a = :a"#).unwrap();
        assert_eq!(result.sql(), r#"SELECT "it's" FROM t WHERE a = ?"#);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_build_query_unterminated_quote_swallows_rest() {
        let result = build_query("SELECT * FROM t WHERE a = :a AND b = 'open :b AND c = :c").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM t WHERE a = ? AND b = 'open :b AND c = :c");
        assert_eq!(result.order(), &["a"]);
    }

    #[test]
    fn test_build_query_colon_without_identifier() {
        let result = build_query("SELECT a : b, 1:2, x::int FROM t WHERE d = :d").unwrap();
        assert_eq!(result.sql(), "SELECT a : b, 1:2, x:? FROM t WHERE d = ?");
        assert_eq!(result.order(), &["int", "d"]);
    }

    #[test]
    fn test_token_pattern_compiles_once() {
        let first = TOKENS.as_ref().unwrap();
        build_query("SELECT :a").unwrap();
        assert!(std::ptr::eq(first, TOKENS.as_ref().unwrap()));
    }

    #[test]
    fn test_build_query_unicode_identifiers() {
        let result = build_query("SELECT * FROM t WHERE a = :a² AND b = :cafe\u{301} AND c = :ünit").unwrap();
        assert_eq!(result.sql(), "SELECT * FROM t WHERE a = ?² AND b = ? AND c = ?");
        assert_eq!(result.order(), &["a", "cafe\u{301}", "ünit"]);
    }

    #[test]
    fn test_build_query_positions_partition_markers() {
        let result = build_query(
            "INSERT INTO e (a, b, c, d) VALUES (:x, :y, :x, :z) ON DUPLICATE KEY UPDATE b = :Y",
        )
        .unwrap();

        let markers = result.sql().matches('?').count();
        assert_eq!(markers, 5);
        assert_eq!(result.len(), markers);

        let mut positions: Vec<usize> = ["x", "y", "z"]
            .iter()
            .flat_map(|name| result.indexes(name).iter().copied())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, (1..=markers).collect::<Vec<_>>());
    }

    #[test]
    fn test_build_query_trims_template() {
        let result = build_query("  SELECT 1 WHERE a = :a \n").unwrap();
        assert_eq!(result.sql(), "SELECT 1 WHERE a = ?");
    }
}
