//! PostgREST table queries.
//!
//! `TableQuery` renders filters into the query string PostgREST expects
//! (`id=eq.<value>`, `order=created_at.desc`, `select=*`). The client methods
//! below map the four table verbs onto HTTP:
//!
//! | verb     | method | notes                                    |
//! |----------|--------|------------------------------------------|
//! | select   | GET    |                                          |
//! | insert   | POST   | `Prefer: return=representation`          |
//! | update   | PATCH  | requires at least one filter             |
//! | delete   | DELETE | requires at least one filter             |
//!
//! `single()` asks PostgREST for exactly one object instead of an array.

use std::fmt::Display;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{BackendClient, send, send_json};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// A query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<(String, bool)>,
    single: bool,
}

impl TableQuery {
    /// Starts a query on `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            single: false,
        }
    }

    /// Columns to return (`*` for all).
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Display) -> Self {
        self.filters.push((field.into(), format!("eq.{value}")));
        self
    }

    /// Orders results by `field`.
    #[must_use]
    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((field.into(), ascending));
        self
    }

    /// Coerces the result to a single object.
    #[must_use]
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Renders the request URL below `base` (which must end with '/').
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base
            .join(&format!("rest/v1/{}", self.table))
            .with_context(|| format!("Invalid table name: {}", self.table))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(columns) = &self.columns {
                pairs.append_pair("select", columns);
            }
            for (field, filter) in &self.filters {
                pairs.append_pair(field, filter);
            }
            if let Some((field, ascending)) = &self.order {
                let direction = if *ascending { "asc" } else { "desc" };
                pairs.append_pair("order", &format!("{field}.{direction}"));
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

impl BackendClient {
    /// Runs a select and decodes the rows (or the single row).
    pub async fn select<T: DeserializeOwned>(
        &self,
        query: &TableQuery,
        access_token: &str,
    ) -> Result<T> {
        let url = query.url(&self.base)?;
        let operation = format!("read {}", query.table);
        let builder = shape(self.request(Method::GET, url, Some(access_token))?, query);
        send_json(builder, &operation).await
    }

    /// Inserts `body` and decodes the created representation.
    pub async fn insert<B, T>(&self, query: &TableQuery, access_token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = query.url(&self.base)?;
        let operation = format!("insert into {}", query.table);
        let builder = shape(self.request(Method::POST, url, Some(access_token))?, query)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        send_json(builder, &operation).await
    }

    /// Applies `body` as a partial update to the filtered rows.
    pub async fn update<B>(&self, query: &TableQuery, access_token: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        if !query.has_filters() {
            anyhow::bail!("Refusing to update every row of {}", query.table);
        }
        let url = query.url(&self.base)?;
        let operation = format!("update {}", query.table);
        let builder = self
            .request(Method::PATCH, url, Some(access_token))?
            .json(body);
        send(builder, &operation).await?;
        Ok(())
    }

    /// Deletes the filtered rows.
    pub async fn delete(&self, query: &TableQuery, access_token: &str) -> Result<()> {
        if !query.has_filters() {
            anyhow::bail!("Refusing to delete every row of {}", query.table);
        }
        let url = query.url(&self.base)?;
        let operation = format!("delete from {}", query.table);
        send(self.request(Method::DELETE, url, Some(access_token))?, &operation).await?;
        Ok(())
    }
}

fn shape(builder: reqwest::RequestBuilder, query: &TableQuery) -> reqwest::RequestBuilder {
    if query.single {
        builder.header(ACCEPT, SINGLE_OBJECT)
    } else {
        builder
    }
}
