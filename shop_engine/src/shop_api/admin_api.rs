//! Back-office order management, scoped to the branches an admin user may act on.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Branch, CustomerSummary, FullOrder, Order, OrderStatusType, MAX_NAME_LENGTH, MAX_PHONE_LENGTH},
    events::{EventProducers, OrderStatusChangedEvent},
    order_objects::{BranchQueryFilter, OrderQueryFilter, OrderScope, OrderUpdate, Page, Pagination},
    traits::{AdminError, AdminManagement},
};

pub struct AdminApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi ({:?})", self.db)
    }
}

impl<B> AdminApi<B>
where B: AdminManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Lists the orders in `scope` that match the filter. Unless the filter asks for a specific payment status, only
    /// paid orders are listed.
    pub async fn search_orders(
        &self,
        scope: OrderScope,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, AdminError> {
        trace!("📦️ Searching orders in scope {scope:?}. {filter}");
        self.db.search_orders(scope, filter, pagination).await
    }

    /// Fetches the order if it falls within `scope`. Orders outside the scope are indistinguishable from orders that
    /// do not exist.
    pub async fn order_by_id(&self, scope: OrderScope, order_id: i64) -> Result<Option<FullOrder>, AdminError> {
        let Some(order) = self.scoped_order(scope, order_id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(Some(FullOrder { order, items }))
    }

    async fn scoped_order(&self, scope: OrderScope, order_id: i64) -> Result<Option<Order>, AdminError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order.filter(|o| scope.includes_branch(o.branch_id)))
    }

    /// Edits the recipient details of an order, or re-routes it to another branch. Only superusers may re-route
    /// orders.
    pub async fn update_order(
        &self,
        scope: OrderScope,
        order_id: i64,
        update: OrderUpdate,
    ) -> Result<Order, AdminError> {
        if update.is_empty() {
            return Err(AdminError::NoOp);
        }
        validate_update(&update)?;
        if update.branch_id.is_some() && !scope.is_superuser() {
            return Err(AdminError::Forbidden("Only superusers can move an order to another branch".into()));
        }
        if self.scoped_order(scope, order_id).await?.is_none() {
            return Err(AdminError::OrderNotFound(order_id));
        }
        let order = self.db.update_order(order_id, update).await?.ok_or(AdminError::OrderNotFound(order_id))?;
        info!("📦️ Order #{order_id} has been updated");
        Ok(order)
    }

    /// Changes the fulfilment status of an order.
    ///
    /// | From \ To | Pending | Shipped | Completed | Cancelled |
    /// |-----------|---------|---------|-----------|-----------|
    /// | Pending   | NoOp    | ok      | ok        | ok        |
    /// | Shipped   | Err     | NoOp    | ok        | ok        |
    /// | Completed | Err     | Err     | NoOp      | Err       |
    /// | Cancelled | Err     | Err     | Err       | NoOp      |
    ///
    /// On success an `OrderStatusChanged` event is published.
    pub async fn modify_status(
        &self,
        scope: OrderScope,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<Order, AdminError> {
        let order = self.scoped_order(scope, order_id).await?.ok_or(AdminError::OrderNotFound(order_id))?;
        let old_status = order.status;
        if old_status == new_status {
            return Err(AdminError::NoOp);
        }
        if !old_status.can_transition_to(new_status) {
            return Err(AdminError::IllegalTransition { from: old_status, to: new_status });
        }
        let updated = match self.db.update_order_status(order_id, old_status, new_status).await? {
            Some(order) => order,
            None => {
                // Somebody else changed the status first
                let current = self.db.fetch_order(order_id).await?.ok_or(AdminError::OrderNotFound(order_id))?;
                warn!("📦️ Order #{order_id} moved to {} before it could become {new_status}", current.status);
                return Err(AdminError::IllegalTransition { from: current.status, to: new_status });
            },
        };
        info!("📦️ Order #{order_id} status changed from {old_status} to {new_status}");
        for emitter in &self.producers.status_changed_producer {
            debug!("📦️ Notifying status changed hook subscribers");
            emitter.publish_event(OrderStatusChangedEvent::new(old_status, updated.clone())).await;
        }
        Ok(updated)
    }

    /// Deletes an order. Only superusers may delete orders, and orders that have been paid for can never be deleted.
    pub async fn delete_order(&self, scope: OrderScope, order_id: i64) -> Result<(), AdminError> {
        if !scope.is_superuser() {
            return Err(AdminError::Forbidden("Only superusers can delete orders".into()));
        }
        let order = self.db.fetch_order(order_id).await?.ok_or(AdminError::OrderNotFound(order_id))?;
        if order.is_paid() || !self.db.delete_unpaid_order(order_id).await? {
            return Err(AdminError::PaidOrderDeletion(order_id));
        }
        warn!("📦️ Order #{order_id} has been deleted");
        Ok(())
    }

    pub async fn list_branches(&self, filter: BranchQueryFilter) -> Result<Vec<Branch>, AdminError> {
        self.db.fetch_branches(filter).await
    }

    pub async fn branch_by_id(&self, branch_id: i64) -> Result<Option<Branch>, AdminError> {
        self.db.fetch_branch(branch_id).await
    }

    pub async fn create_branch(&self, name: &str, is_active: bool) -> Result<Branch, AdminError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(AdminError::ValidationError(format!(
                "Branch names must be between 1 and {MAX_NAME_LENGTH} characters"
            )));
        }
        let branch = self.db.insert_branch(name, is_active).await?;
        info!("📦️ Branch #{} '{}' created", branch.id, branch.name);
        Ok(branch)
    }

    pub async fn set_branch_active(&self, branch_id: i64, is_active: bool) -> Result<Branch, AdminError> {
        let branch =
            self.db.set_branch_active(branch_id, is_active).await?.ok_or(AdminError::BranchNotFound(branch_id))?;
        info!("📦️ Branch #{branch_id} is now {}", if is_active { "active" } else { "inactive" });
        Ok(branch)
    }

    pub async fn list_customers(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<Page<CustomerSummary>, AdminError> {
        let search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.db.search_customers(search, pagination).await
    }
}

fn validate_update(update: &OrderUpdate) -> Result<(), AdminError> {
    let too_long = |value: &Option<String>, max: usize| value.as_ref().map(|v| v.chars().count() > max);
    if too_long(&update.recipient_name, MAX_NAME_LENGTH).unwrap_or(false) {
        return Err(AdminError::ValidationError(format!("recipient_name is limited to {MAX_NAME_LENGTH} characters")));
    }
    if too_long(&update.recipient_number, MAX_PHONE_LENGTH).unwrap_or(false) {
        return Err(AdminError::ValidationError(format!(
            "recipient_number is limited to {MAX_PHONE_LENGTH} characters"
        )));
    }
    Ok(())
}
