//! PostgREST table client.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{SupabaseClient, SupabaseError};

/// Row selection for a PostgREST request.
#[derive(Debug, Clone)]
pub struct Query {
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<u32>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select specific columns (PostgREST `select=` syntax).
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Order rows by a column.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{}.{}", column, direction));
        self
    }

    /// Return at most `n` rows.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().cloned());
        if let Some(ref order) = self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Parse the total out of a `Content-Range` header (`0-4/42` or `*/42`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Client for table rows through PostgREST.
#[derive(Clone, Debug)]
pub struct RestClient {
    client: SupabaseClient,
}

impl RestClient {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table_url(&self, table: &str) -> Result<url::Url, SupabaseError> {
        self.client
            .url(&format!("rest/v1/{}", urlencoding::encode(table)))
    }

    /// Select rows from a table.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.table_url(table)?;
        let req = self.client.http().get(url).query(&query.to_pairs());
        self.client.send_json(req).await
    }

    /// Exact number of rows in a table.
    pub async fn count(&self, table: &str) -> Result<u64, SupabaseError> {
        let url = self.table_url(table)?;
        let req = self
            .client
            .http()
            .head(url)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let response = self.client.send(req).await?;

        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SupabaseError::Decode("missing Content-Range header".to_string()))?;
        parse_content_range_total(range)
            .ok_or_else(|| SupabaseError::Decode(format!("unparseable Content-Range: {}", range)))
    }

    /// Insert rows and return them as stored.
    pub async fn insert<R, T>(&self, table: &str, rows: &[R]) -> Result<Vec<T>, SupabaseError>
    where
        R: Serialize,
        T: DeserializeOwned,
    {
        let url = self.table_url(table)?;
        let req = self
            .client
            .http()
            .post(url)
            .header("Prefer", "return=representation")
            .json(rows);
        self.client.send_json(req).await
    }

    /// Delete rows where `column` equals `value`; returns the deleted rows.
    pub async fn delete_eq<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.table_url(table)?;
        let req = self
            .client
            .http()
            .delete(url)
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", "return=representation");
        self.client.send_json(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let query = Query::new()
            .columns("id,email")
            .eq("email", "a@b.c")
            .order("created_at", false)
            .limit(5);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("select".to_string(), "id,email".to_string()),
                ("email".to_string(), "eq.a@b.c".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_query_selects_everything() {
        assert_eq!(
            Query::new().to_pairs(),
            vec![("select".to_string(), "*".to_string())]
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-4/42"), Some(42));
        assert_eq!(parse_content_range_total("0-4/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
