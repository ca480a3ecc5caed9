//! Request workflow tests
//!
//! Tests for the cross-role request lifecycle:
//! - pending -> fulfilled | rejected, exactly once
//! - Role-gated transitions
//! - Refill fulfillment restocks through the ledger
//! - New-product fulfillment creates one product with defaulted suggestions
//! - Inventory controllers only see their own requests

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_delta, Actor, FulfillInput, FulfillmentPlan, NewProductDetails, Operation,
    RefillDetails, Request, RequestError, RequestKind, RequestPayload, RequestStatus, Role,
};
use uuid::Uuid;

fn actor(role: Role) -> Actor {
    Actor::new(Uuid::new_v4(), role)
}

fn refill_request(product_id: Uuid, quantity_requested: i32, requested_by: Uuid) -> Request {
    Request::new_pending(
        Uuid::new_v4(),
        RequestKind::Refill(RefillDetails {
            product_id,
            quantity_requested,
        }),
        String::new(),
        requested_by,
        Utc::now(),
    )
}

fn new_product_request(requested_by: Uuid) -> Request {
    let payload = RequestPayload {
        request_type: Some("new_product".into()),
        product_name: Some("Oat Milk".into()),
        category: Some("Dairy alternatives".into()),
        ..Default::default()
    };
    Request::new_pending(
        Uuid::new_v4(),
        RequestKind::from_payload(&payload).unwrap(),
        "Customers keep asking".into(),
        requested_by,
        Utc::now(),
    )
}

/// The visibility rule the request listing applies
fn visible_to<'a>(actor: &Actor, requests: &'a [Request], status: Option<RequestStatus>) -> Vec<&'a Request> {
    requests
        .iter()
        .filter(|r| !actor.sees_only_own_requests() || r.requested_by == actor.id)
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Refill{P, 20} fulfilled with {S, 15}: P +15, Restock{P, S, 15}, fulfilled
    #[test]
    fn test_refill_fulfilled_with_explicit_quantity() {
        let product_id = Uuid::new_v4();
        let supplier_id = Uuid::new_v4();
        let inventory = actor(Role::Inventory);
        let supplier = actor(Role::Supplier);
        let mut request = refill_request(product_id, 20, inventory.id);

        let plan = request
            .plan_fulfillment(
                &supplier,
                &FulfillInput {
                    supplier_id: Some(supplier_id),
                    quantity_added: Some(15),
                },
            )
            .unwrap();

        assert_eq!(
            plan,
            FulfillmentPlan::Restock {
                product_id,
                supplier_id,
                quantity: 15,
            }
        );

        let stock_before = 4;
        let stock_after = match plan {
            FulfillmentPlan::Restock { quantity, .. } => apply_delta(stock_before, quantity).unwrap(),
            FulfillmentPlan::CreateProduct(_) => unreachable!(),
        };
        assert_eq!(stock_after, 19);

        let now = Utc::now();
        request.fulfill(&supplier, now, None).unwrap();
        assert_eq!(request.status, RequestStatus::Fulfilled);
        assert_eq!(request.fulfilled_by, Some(supplier.id));
        assert_eq!(request.fulfilled_at, Some(now));
        assert_eq!(request.created_product_id, None);
    }

    #[test]
    fn test_refill_without_quantity_uses_requested() {
        let request = refill_request(Uuid::new_v4(), 20, Uuid::new_v4());
        let plan = request
            .plan_fulfillment(
                &actor(Role::Admin),
                &FulfillInput {
                    supplier_id: Some(Uuid::new_v4()),
                    quantity_added: None,
                },
            )
            .unwrap();

        assert!(matches!(plan, FulfillmentPlan::Restock { quantity: 20, .. }));

        // A zero quantityAdded also falls back to the requested amount
        let plan = request
            .plan_fulfillment(
                &actor(Role::Admin),
                &FulfillInput {
                    supplier_id: Some(Uuid::new_v4()),
                    quantity_added: Some(0),
                },
            )
            .unwrap();
        assert!(matches!(plan, FulfillmentPlan::Restock { quantity: 20, .. }));
    }

    #[test]
    fn test_refill_needs_supplier() {
        let request = refill_request(Uuid::new_v4(), 5, Uuid::new_v4());
        let err = request
            .plan_fulfillment(&actor(Role::Supplier), &FulfillInput::default())
            .unwrap_err();

        match err {
            RequestError::Invalid(invalid) => {
                assert_eq!(invalid.field, "supplierId");
                assert_eq!(invalid.message, "supplierId and quantityAdded (min 1) required");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(request.is_pending());
    }

    #[test]
    fn test_new_product_fulfillment_creates_defaulted_product() {
        let mut request = new_product_request(Uuid::new_v4());
        let admin = actor(Role::Admin);

        let plan = request
            .plan_fulfillment(&admin, &FulfillInput::default())
            .unwrap();
        let new_product = match plan {
            FulfillmentPlan::CreateProduct(product) => product,
            other => panic!("unexpected plan {:?}", other),
        };

        assert_eq!(new_product.product_name, "Oat Milk");
        assert_eq!(new_product.category, "Dairy alternatives");
        assert_eq!(new_product.description, "");
        assert_eq!(new_product.price, Decimal::ZERO);
        assert_eq!(new_product.quantity, 0);
        assert_eq!(new_product.min_threshold, 0);

        let created = Uuid::new_v4();
        request.fulfill(&admin, Utc::now(), Some(created)).unwrap();
        assert_eq!(request.created_product_id, Some(created));
    }

    /// Rejecting a fulfilled request fails and changes nothing
    #[test]
    fn test_reject_fulfilled_request_is_invalid() {
        let supplier = actor(Role::Supplier);
        let mut request = refill_request(Uuid::new_v4(), 3, Uuid::new_v4());
        request.fulfill(&supplier, Utc::now(), None).unwrap();
        let snapshot = request.clone();

        let err = request
            .reject(&supplier, Utc::now(), Some("too late".into()))
            .unwrap_err();

        assert_eq!(
            err,
            RequestError::NotPending {
                status: RequestStatus::Fulfilled
            }
        );
        assert_eq!(err.to_string(), "Request is not pending");
        assert_eq!(request, snapshot);
    }

    #[test]
    fn test_reject_records_reason_and_actor() {
        let admin = actor(Role::Admin);
        let mut request = new_product_request(Uuid::new_v4());

        request
            .reject(&admin, Utc::now(), Some("Not stocked here".into()))
            .unwrap();

        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.fulfilled_by, Some(admin.id));
        assert_eq!(request.rejection_reason.as_deref(), Some("Not stocked here"));
        assert_eq!(request.created_product_id, None);
    }

    #[test]
    fn test_only_admin_and_supplier_transition() {
        for role in [Role::Inventory, Role::Sales] {
            let mut request = refill_request(Uuid::new_v4(), 3, Uuid::new_v4());
            let someone = actor(role);

            assert!(matches!(
                request.plan_fulfillment(&someone, &FulfillInput::default()),
                Err(RequestError::Forbidden(_))
            ));
            assert!(matches!(
                request.reject(&someone, Utc::now(), None),
                Err(RequestError::Forbidden(_))
            ));
            assert!(request.is_pending());
        }
    }

    #[test]
    fn test_only_admin_and_inventory_create() {
        assert!(actor(Role::Admin).authorize(Operation::CreateRequest).is_ok());
        assert!(actor(Role::Inventory).authorize(Operation::CreateRequest).is_ok());
        assert!(actor(Role::Sales).authorize(Operation::CreateRequest).is_err());
        assert!(actor(Role::Supplier).authorize(Operation::CreateRequest).is_err());
    }

    /// An inventory controller sees only their own requests, whatever the status filter
    #[test]
    fn test_inventory_sees_only_own_requests() {
        let me = actor(Role::Inventory);
        let colleague = actor(Role::Inventory);
        let supplier = actor(Role::Supplier);

        let mut mine_fulfilled = refill_request(Uuid::new_v4(), 2, me.id);
        mine_fulfilled.fulfill(&supplier, Utc::now(), None).unwrap();
        let requests = vec![
            refill_request(Uuid::new_v4(), 1, me.id),
            mine_fulfilled,
            refill_request(Uuid::new_v4(), 1, colleague.id),
            new_product_request(colleague.id),
        ];

        let all_mine = visible_to(&me, &requests, None);
        assert_eq!(all_mine.len(), 2);
        assert!(all_mine.iter().all(|r| r.requested_by == me.id));

        let pending_mine = visible_to(&me, &requests, Some(RequestStatus::Pending));
        assert_eq!(pending_mine.len(), 1);

        assert_eq!(visible_to(&supplier, &requests, None).len(), 4);
        assert_eq!(
            visible_to(&supplier, &requests, Some(RequestStatus::Pending)).len(),
            3
        );
    }

    #[test]
    fn test_unknown_status_filter_is_rejected() {
        assert!("pending".parse::<RequestStatus>().is_ok());
        let err = "archived".parse::<RequestStatus>().unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn test_request_json_shape() {
        let request = new_product_request(Uuid::new_v4());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "new_product");
        assert_eq!(json["productName"], "Oat Milk");
        assert_eq!(json["suggestedQuantity"], 0);
        assert_eq!(json["status"], "pending");
        assert!(json["createdProductId"].is_null());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Attempt {
        Fulfill,
        Reject,
    }

    fn attempt_strategy() -> impl Strategy<Value = Attempt> {
        prop_oneof![Just(Attempt::Fulfill), Just(Attempt::Reject)]
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::Admin),
            Just(Role::Inventory),
            Just(Role::Sales),
            Just(Role::Supplier),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Only the first permitted transition succeeds; everything after it
        /// fails and leaves the request unchanged
        #[test]
        fn prop_request_transitions_exactly_once(
            attempts in prop::collection::vec((attempt_strategy(), role_strategy()), 1..12)
        ) {
            let mut request = refill_request(Uuid::new_v4(), 5, Uuid::new_v4());
            let mut transitioned = false;

            for (attempt, role) in attempts {
                let who = actor(role);
                let snapshot = request.clone();
                let result = match attempt {
                    Attempt::Fulfill => request.fulfill(&who, Utc::now(), None),
                    Attempt::Reject => request.reject(&who, Utc::now(), None),
                };

                let permitted = matches!(role, Role::Admin | Role::Supplier);
                if permitted && !transitioned {
                    prop_assert!(result.is_ok());
                    prop_assert!(request.status.is_terminal());
                    transitioned = true;
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(&request, &snapshot);
                }
            }
        }

        /// Effective refill quantity is quantityAdded when >= 1, else quantityRequested
        #[test]
        fn prop_effective_refill_quantity(
            requested in 1i32..1_000,
            added in prop::option::of(-10i64..1_000)
        ) {
            let request = refill_request(Uuid::new_v4(), requested, Uuid::new_v4());
            let plan = request.plan_fulfillment(
                &actor(Role::Supplier),
                &FulfillInput { supplier_id: Some(Uuid::new_v4()), quantity_added: added },
            ).unwrap();

            let expected = match added {
                Some(a) if a >= 1 => a as i32,
                _ => requested,
            };
            match plan {
                FulfillmentPlan::Restock { quantity, .. } => prop_assert_eq!(quantity, expected),
                other => prop_assert!(false, "unexpected plan {:?}", other),
            }
        }

        /// New-product payloads keep the given suggestions and default the rest to 0
        #[test]
        fn prop_new_product_suggestions(
            quantity in prop::option::of(0i64..10_000),
            threshold in prop::option::of(0i64..10_000),
            cents in prop::option::of(0i64..1_000_000)
        ) {
            let payload = RequestPayload {
                request_type: Some("new_product".into()),
                product_name: Some("Item".into()),
                suggested_quantity: quantity,
                suggested_min_threshold: threshold,
                suggested_price: cents.map(|c| Decimal::new(c, 2)),
                ..Default::default()
            };

            let details = match RequestKind::from_payload(&payload).unwrap() {
                RequestKind::NewProduct(details) => details,
                other => return Err(TestCaseError::fail(format!("unexpected kind {:?}", other))),
            };
            let product = NewProductDetails::to_new_product(&details);

            prop_assert_eq!(product.quantity as i64, quantity.unwrap_or(0));
            prop_assert_eq!(product.min_threshold as i64, threshold.unwrap_or(0));
            prop_assert_eq!(product.price, cents.map(|c| Decimal::new(c, 2)).unwrap_or(Decimal::ZERO));
        }
    }
}
