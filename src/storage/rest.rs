// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgREST client for the hosted mirror store.
//!
//! Rows live under `{base}/rest/v1/{table}`. Filters use PostgREST operators
//! (`is_active=eq.true`, `or=(a.eq."x",b.eq."x")`), inserts ask for the stored
//! row back with `Prefer: return=representation`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::*;

const REST_PREFIX: &str = "rest/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Mirror store reached over the PostgREST HTTP interface.
#[derive(Debug, Clone)]
pub struct RestMirror {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestMirror {
    pub fn new(base_url: &str, api_key: &str) -> MirrorResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| MirrorError::Request(format!("invalid mirror store URL: {e}")))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MirrorError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> MirrorResult<Vec<T>> {
        let response = self
            .http
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(query)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| MirrorError::Request(format!("GET {table} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Status {
                table,
                status,
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| MirrorError::InvalidResponse(format!("GET {table}: {e}")))
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        row: &B,
    ) -> MirrorResult<T> {
        let response = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| MirrorError::Request(format!("POST {table} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Status {
                table,
                status,
                body,
            });
        }

        let mut rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| MirrorError::InvalidResponse(format!("POST {table}: {e}")))?;
        debug!(table, rows = rows.len(), "Mirror insert acknowledged");

        if rows.is_empty() {
            return Err(MirrorError::InvalidResponse(format!(
                "POST {table} returned no rows"
            )));
        }
        Ok(rows.swap_remove(0))
    }
}

/// Double-quote a value inside a PostgREST logic tree so reserved
/// characters (`,.:()`) in it cannot open another clause.
fn quoted(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn newest_first() -> (&'static str, String) {
    ("order", "created_at.desc".to_string())
}

#[async_trait]
impl MirrorStore for RestMirror {
    async fn active_token(&self) -> MirrorResult<Option<TokenRecord>> {
        let rows: Vec<TokenRecord> = self
            .select(
                TOKENS_TABLE,
                &[
                    ("is_active", "eq.true".to_string()),
                    newest_first(),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_active_tokens(&self) -> MirrorResult<Vec<TokenRecord>> {
        self.select(
            TOKENS_TABLE,
            &[("is_active", "eq.true".to_string()), newest_first()],
        )
        .await
    }

    async fn insert_token(&self, token: NewToken) -> MirrorResult<TokenRecord> {
        self.insert(TOKENS_TABLE, &token).await
    }

    async fn insert_aid_token(&self, aid: NewAidToken) -> MirrorResult<AidTokenRecord> {
        self.insert(AID_TOKENS_TABLE, &aid).await
    }

    async fn list_aid_tokens(&self, recipient_id: &str) -> MirrorResult<Vec<AidTokenRecord>> {
        self.select(
            AID_TOKENS_TABLE,
            &[("recipient_id", format!("eq.{recipient_id}")), newest_first()],
        )
        .await
    }

    async fn insert_distribution(
        &self,
        distribution: NewDistribution,
    ) -> MirrorResult<DistributionRecord> {
        self.insert(DISTRIBUTIONS_TABLE, &distribution).await
    }

    async fn list_distributions(&self, user_id: &str) -> MirrorResult<Vec<DistributionRecord>> {
        let user = quoted(user_id);
        self.select(
            DISTRIBUTIONS_TABLE,
            &[
                ("or", format!("(distributor_id.eq.{user},recipient_id.eq.{user})")),
                newest_first(),
            ],
        )
        .await
    }

    async fn insert_transaction(
        &self,
        transaction: NewLedgerTransaction,
    ) -> MirrorResult<LedgerTransactionRecord> {
        self.insert(TRANSACTIONS_TABLE, &transaction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_row(name: &str) -> serde_json::Value {
        json!({
            "id": "7f1c0c3e-9a55-4c2b-8d0e-0f7b6a1d2c3e",
            "creator_id": "user-1",
            "name": name,
            "symbol": "AIDX",
            "supply": 1000,
            "contract_address": "0.0.5000",
            "midnight_tx_hash": "0.0.1001@1700000000.000000001",
            "is_active": true,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn active_token_filters_orders_and_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tokens"))
            .and(query_param("is_active", "eq.true"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "1"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([token_row("Aid")])))
            .expect(1)
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        let token = mirror.active_token().await.unwrap().unwrap();
        assert_eq!(token.name, "Aid");
        assert_eq!(token.ledger_token_id.as_deref(), Some("0.0.5000"));
    }

    #[tokio::test]
    async fn empty_select_means_no_active_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        assert!(mirror.active_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_requests_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/tokens"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(json!({
                "name": "Aid",
                "contract_address": "0.0.5000"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([token_row("Aid")])))
            .expect(1)
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        let stored = mirror
            .insert_token(NewToken {
                creator_id: "user-1".to_string(),
                name: "Aid".to_string(),
                symbol: "AIDX".to_string(),
                supply: 1000,
                ledger_token_id: "0.0.5000".to_string(),
                ledger_tx_id: "0.0.1001@1700000000.000000001".to_string(),
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(stored.supply, 1000);
    }

    #[tokio::test]
    async fn distributions_query_either_party() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/distributions"))
            .and(query_param(
                "or",
                r#"(distributor_id.eq."user-1",recipient_id.eq."user-1")"#,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        assert!(mirror.list_distributions("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reserved_characters_in_user_id_stay_inside_one_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/distributions"))
            .and(query_param(
                "or",
                r#"(distributor_id.eq."x,id.not.is.null",recipient_id.eq."x,id.not.is.null")"#,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        assert!(mirror
            .list_distributions("x,id.not.is.null")
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn quoted_escapes_quotes_and_backslashes() {
        assert_eq!(quoted("user-1"), r#""user-1""#);
        assert_eq!(quoted(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/aid_tokens"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let mirror = RestMirror::new(&server.uri(), "anon-key").unwrap();
        let err = mirror
            .insert_aid_token(NewAidToken {
                recipient_id: "0.0.2002".to_string(),
                token_id: "AID_1".to_string(),
                amount: 10,
                token_type: "food".to_string(),
                ledger_token_id: "0.0.5000".to_string(),
                ledger_tx_id: "tx".to_string(),
                restrictions: None,
                expires_at: None,
                is_active: true,
                used_amount: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Status {
                table: "aid_tokens",
                status: 409,
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(RestMirror::new("not a url", "key").is_err());
    }
}
