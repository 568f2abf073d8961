// ── I/O seams of the monitor ──
//
// `FuelApiClient` implements both; tests substitute in-memory fakes.

use std::future::Future;

use tankwatch_api::{FuelApiClient, OrderRequest, Percent};

use crate::error::CoreError;

/// Point-in-time level lookup (`GET get_level`).
pub trait LevelSource: Send + Sync + 'static {
    fn fetch_level(&self) -> impl Future<Output = Result<Percent, CoreError>> + Send;
}

/// The order API calls the reorder pipeline makes.
pub trait OrderSink: Send + Sync + 'static {
    fn create_order(
        &self,
        request: &OrderRequest,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn send_reorder_notification(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl LevelSource for FuelApiClient {
    async fn fetch_level(&self) -> Result<Percent, CoreError> {
        Ok(FuelApiClient::fetch_level(self).await?)
    }
}

impl OrderSink for FuelApiClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<(), CoreError> {
        Ok(FuelApiClient::create_order(self, request).await?)
    }

    async fn send_reorder_notification(&self, email: &str) -> Result<(), CoreError> {
        Ok(FuelApiClient::send_reorder_notification(self, email).await?)
    }
}
