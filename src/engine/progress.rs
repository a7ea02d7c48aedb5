use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    OrderEngine,
    domain::{Order, OrderCode, Progress, ProgressChange},
};
use crate::core::app_error::AppError;

/// Attempts made to find an unused code before giving up.
const MAX_CODE_ATTEMPTS: usize = 8;

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressReq {
    pub progress: Option<String>,
    pub order_code: Option<String>,
    pub reason: Option<String>,
}

impl OrderEngine<'_> {
    /// Moves an order the caller owns to a new progress state.
    ///
    /// Entering `accepted` or `done` claims the supplied order code unless the
    /// order already holds it. Entering `done` deducts stock for every line
    /// item; a shortage on any of them rejects the whole transition.
    pub async fn update_progress(
        &self,
        caller: Uuid,
        order_id: Uuid,
        request: UpdateProgressReq,
    ) -> Result<Order, AppError> {
        let progress = request
            .progress
            .as_deref()
            .and_then(|raw| raw.trim().parse::<Progress>().ok())
            .ok_or_else(|| AppError::BadRequest("Invalid progress value.".into()))?;

        let order = self.owned_order(caller, order_id).await?;

        if order.progress == Progress::Done {
            return Err(AppError::ImmutableState(
                "Completed orders cannot be modified.".into(),
            ));
        }

        let mut change = ProgressChange {
            progress,
            assign_code: None,
            reason: None,
            deduct_stock: Vec::new(),
        };

        if progress == Progress::Declined {
            let reason = request
                .reason
                .filter(|reason| !reason.trim().is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest("A reason is required to decline an order.".into())
                })?;
            change.reason = Some(reason);
        }

        if progress.requires_order_code() {
            let raw = request
                .order_code
                .filter(|code| !code.trim().is_empty())
                .ok_or_else(|| AppError::BadRequest("Order code is required.".into()))?;
            let code =
                OrderCode::parse(&raw).map_err(|err| AppError::BadRequest(err.to_string()))?;

            if order.order_code.as_ref() != Some(&code) {
                self.ensure_code_is_free(&code, order.id).await?;
                change.assign_code = Some(code);
            }
        }

        if progress == Progress::Done {
            change.deduct_stock = order.products.clone();
        }

        let updated = self.store.apply_progress(order.id, &change).await?;

        info!(
            order_id = %updated.id,
            from = %order.progress,
            to = %updated.progress,
            order_code = ?updated.order_code.as_ref().map(OrderCode::as_str),
            "Order progress updated"
        );
        Ok(updated)
    }

    async fn ensure_code_is_free(&self, code: &OrderCode, order_id: Uuid) -> Result<(), AppError> {
        match self.store.find_order_by_code(code).await? {
            Some(holder) if holder.id != order_id => Err(AppError::Conflict(format!(
                "Order code {} is already in use.",
                code
            ))),
            _ => Ok(()),
        }
    }

    /// A random code no order currently holds.
    pub async fn suggest_order_code(&self) -> Result<OrderCode, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = OrderCode::generate(&mut rand::thread_rng());
            if self.store.find_order_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }

        Err(AppError::Conflict(
            "Could not find an unused order code, try again.".into(),
        ))
    }
}
