//! Inbound client event routing.
//!
//! Each handler resolves the rooms that own the interested parties from the
//! correlating ids, then emits one outbound event per room. Delivery is
//! at-most-once: nothing is retried, and a skipped notification is reported
//! to the caller instead of failing the connection.

use chrono::Utc;
use market_common::protocol::{
    ChatMessage, ChatSend, NeedCreate, NeedNew, NeedOffer, OfferAccept, OfferAccepted,
    OfferRejected, OfferSubmit, OrderNew, OrderRef, OrderUpdate,
};
use market_common::{Envelope, EventName, Room};
use serde::de::DeserializeOwned;

use crate::AppState;

use super::fanout::Target;
use super::outcome::{Notified, Outcome, Skipped};
use super::session::GatewaySession;

/// Longest chat message relayed, in bytes.
const MAX_CHAT_MESSAGE_LEN: usize = 4000;

/// Route one inbound event from `session`.
pub async fn dispatch(state: &AppState, session: &GatewaySession, envelope: Envelope) -> Outcome {
    match envelope.event.as_str() {
        EventName::NEED_CREATE => need_create(state, decode(&envelope)?).await,
        EventName::OFFER_SUBMIT => offer_submit(state, decode(&envelope)?).await,
        EventName::OFFER_ACCEPT => offer_accept(state, decode(&envelope)?).await,
        EventName::ORDER_NEW => order_new(state, decode(&envelope)?).await,
        EventName::ORDER_ASSIGN => {
            order_customer_update(
                state,
                decode(&envelope)?,
                EventName::ORDER_ASSIGN,
                "Your order has been assigned and is being processed",
            )
            .await
        }
        EventName::ORDER_COMPLETE => {
            order_customer_update(
                state,
                decode(&envelope)?,
                EventName::ORDER_COMPLETE,
                "Your order has been completed",
            )
            .await
        }
        EventName::CHAT_MESSAGE => chat_message(state, session, decode(&envelope)?),
        EventName::CHAT_JOIN => {
            let OrderRef { order_id } = decode(&envelope)?;
            session.join(Room::chat(order_id));
            Ok(Notified::default())
        }
        other => Err(Skipped::UnknownEvent(other.to_string())),
    }
}

fn decode<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, Skipped> {
    envelope.payload().map_err(|e| Skipped::MalformedPayload {
        event: envelope.event.clone(),
        reason: e.to_string(),
    })
}

/// Fan a new need out to every seller that is online and approved right now.
async fn need_create(state: &AppState, payload: NeedCreate) -> Outcome {
    let sellers = state.store.online_approved_sellers().await?;

    let now = Utc::now();
    let mut notified = Notified::default();
    for seller in sellers {
        notified.push(state.gateway.emit(
            Target::Room(Room::seller(&seller.id)),
            EventName::NEED_NEW,
            &NeedNew {
                need_id: payload.need_id.clone(),
                message: "A customer is requesting offers".to_string(),
                timestamp: now,
            },
        ));
    }
    Ok(notified)
}

/// Tell the need's owner that a seller has made an offer.
async fn offer_submit(state: &AppState, payload: OfferSubmit) -> Outcome {
    let need = state
        .store
        .need_by_id(&payload.need_id)
        .await?
        .ok_or_else(|| Skipped::not_found("need", &payload.need_id))?;

    let mut notified = Notified::default();
    notified.push(state.gateway.emit(
        Target::Room(Room::user(&need.customer_id)),
        EventName::NEED_OFFER,
        &NeedOffer {
            need_id: payload.need_id,
            offer_id: payload.offer_id,
            message: "You received a new offer on your request".to_string(),
            timestamp: Utc::now(),
        },
    ));
    Ok(notified)
}

/// Notify the customer and the winning seller, then every other seller who
/// offered on the same need. Losers are all other offer rows; no price
/// comparison happens here. An offer made on a different need counts as
/// missing.
async fn offer_accept(state: &AppState, payload: OfferAccept) -> Outcome {
    let need = state
        .store
        .need_by_id(&payload.need_id)
        .await?
        .ok_or_else(|| Skipped::not_found("need", &payload.need_id))?;
    let accepted = state
        .store
        .offer_by_id(&payload.offer_id)
        .await?
        .filter(|offer| offer.need_id == payload.need_id)
        .ok_or_else(|| Skipped::not_found("offer", &payload.offer_id))?;
    let others = state
        .store
        .offers_for_need_except(&payload.need_id, &payload.offer_id)
        .await?;

    let now = Utc::now();
    let accept = OfferAccepted {
        need_id: payload.need_id.clone(),
        offer_id: payload.offer_id.clone(),
        order_id: payload.order_id.clone(),
        message: "Offer accepted, an order has been created".to_string(),
        timestamp: now,
    };

    let mut notified = Notified::default();
    for room in [Room::user(&need.customer_id), Room::seller(&accepted.seller_id)] {
        notified.push(
            state
                .gateway
                .emit(Target::Room(room), EventName::OFFER_ACCEPT, &accept),
        );
    }

    for offer in others {
        notified.push(state.gateway.emit(
            Target::Room(Room::seller(&offer.seller_id)),
            EventName::OFFER_REJECTED,
            &OfferRejected {
                need_id: payload.need_id.clone(),
                offer_id: offer.id,
                message: "The customer accepted another offer".to_string(),
                timestamp: now,
            },
        ));
    }
    Ok(notified)
}

/// Tell the order's seller about a new order.
async fn order_new(state: &AppState, payload: OrderRef) -> Outcome {
    let order = state
        .store
        .order_by_id(&payload.order_id)
        .await?
        .ok_or_else(|| Skipped::not_found("order", &payload.order_id))?;

    let mut notified = Notified::default();
    notified.push(state.gateway.emit(
        Target::Room(Room::seller(&order.seller_id)),
        EventName::ORDER_NEW,
        &OrderNew {
            message: format!("New order #{} received", order.order_number),
            order_id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            product_id: order.product_id,
            total_amount: order.total_amount,
            timestamp: Utc::now(),
        },
    ));
    Ok(notified)
}

/// Shared by `order:assign` and `order:complete`: notify the order's customer.
async fn order_customer_update(
    state: &AppState,
    payload: OrderRef,
    event: &'static str,
    message: &str,
) -> Outcome {
    let order = state
        .store
        .order_by_id(&payload.order_id)
        .await?
        .ok_or_else(|| Skipped::not_found("order", &payload.order_id))?;

    let mut notified = Notified::default();
    notified.push(state.gateway.emit(
        Target::Room(Room::user(&order.customer_id)),
        event,
        &OrderUpdate {
            order_id: order.id,
            message: message.to_string(),
            timestamp: Utc::now(),
        },
    ));
    Ok(notified)
}

/// Relay a chat line to the order's chat room, sender included.
fn chat_message(state: &AppState, session: &GatewaySession, payload: ChatSend) -> Outcome {
    let text = payload.message.trim();
    if text.is_empty() || text.len() > MAX_CHAT_MESSAGE_LEN {
        return Err(Skipped::MalformedPayload {
            event: EventName::CHAT_MESSAGE.to_string(),
            reason: format!("message must be 1-{MAX_CHAT_MESSAGE_LEN} bytes"),
        });
    }

    let room = Room::chat(&payload.order_id);
    session.join(room.clone());

    let mut notified = Notified::default();
    notified.push(state.gateway.emit(
        Target::Room(room),
        EventName::CHAT_MESSAGE,
        &ChatMessage {
            order_id: payload.order_id,
            sender_id: session.principal.user_id().to_string(),
            sender_role: session.principal.role(),
            message: text.to_string(),
            timestamp: Utc::now(),
        },
    ));
    Ok(notified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::principal::Principal;
    use crate::gateway::testing::{need, offer, order, seller, test_state};
    use serde_json::json;

    fn customer_session() -> GatewaySession {
        GatewaySession::new("conn_c".into(), Principal::Customer { id: "usr_c".into() })
    }

    fn event(name: &str, data: serde_json::Value) -> Envelope {
        Envelope::new(name, data)
    }

    #[tokio::test]
    async fn need_create_targets_only_online_approved_sellers() {
        let (state, store) = test_state();
        store.insert_seller(seller("sel_on", "usr_1", true, true));
        store.insert_seller(seller("sel_off", "usr_2", false, true));
        store.insert_seller(seller("sel_unapproved", "usr_3", true, false));

        let notified = dispatch(
            &state,
            &customer_session(),
            event(EventName::NEED_CREATE, json!({ "needId": "need_1" })),
        )
        .await
        .unwrap();

        assert_eq!(
            notified.rooms_for(EventName::NEED_NEW),
            vec![&Room::seller("sel_on")]
        );
    }

    #[tokio::test]
    async fn need_create_with_no_sellers_emits_nothing() {
        let (state, _store) = test_state();
        let notified = dispatch(
            &state,
            &customer_session(),
            event(EventName::NEED_CREATE, json!({ "needId": "need_1" })),
        )
        .await
        .unwrap();
        assert!(notified.is_empty());
    }

    #[tokio::test]
    async fn offer_submit_notifies_need_owner() {
        let (state, store) = test_state();
        store.insert_need(need("need_1", "usr_c"));
        let mut rx = state.gateway.subscribe();

        let notified = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::OFFER_SUBMIT,
                json!({ "needId": "need_1", "offerId": "ofr_1" }),
            ),
        )
        .await
        .unwrap();
        assert_eq!(
            notified.rooms_for(EventName::NEED_OFFER),
            vec![&Room::user("usr_c")]
        );

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.data["needId"], "need_1");
        assert_eq!(payload.data["offerId"], "ofr_1");
    }

    #[tokio::test]
    async fn offer_submit_for_missing_need_is_skipped() {
        let (state, _store) = test_state();
        let result = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::OFFER_SUBMIT,
                json!({ "needId": "need_missing", "offerId": "ofr_1" }),
            ),
        )
        .await;
        assert!(matches!(result, Err(Skipped::NotFound { kind: "need", .. })));
    }

    #[tokio::test]
    async fn offer_accept_notifies_winner_and_rejects_every_other_offer() {
        let (state, store) = test_state();
        store.insert_need(need("need_1", "usr_c"));
        store.insert_offer(offer("ofr_win", "need_1", "sel_a", 120.0));
        store.insert_offer(offer("ofr_t", "need_1", "sel_t", 130.0));
        store.insert_offer(offer("ofr_u", "need_1", "sel_u", 110.0));
        store.insert_offer(offer("ofr_other_need", "need_2", "sel_v", 90.0));

        let notified = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::OFFER_ACCEPT,
                json!({ "needId": "need_1", "offerId": "ofr_win", "orderId": "ord_1" }),
            ),
        )
        .await
        .unwrap();

        assert_eq!(
            notified.rooms_for(EventName::OFFER_ACCEPT),
            vec![&Room::user("usr_c"), &Room::seller("sel_a")]
        );
        assert_eq!(
            notified.rooms_for(EventName::OFFER_REJECTED),
            vec![&Room::seller("sel_t"), &Room::seller("sel_u")]
        );
    }

    #[tokio::test]
    async fn offer_accept_for_offer_on_another_need_is_skipped() {
        let (state, store) = test_state();
        store.insert_need(need("need_1", "usr_c"));
        store.insert_offer(offer("ofr_t", "need_1", "sel_t", 130.0));
        store.insert_offer(offer("ofr_u", "need_1", "sel_u", 110.0));
        store.insert_offer(offer("ofr_elsewhere", "need_2", "sel_v", 90.0));
        let mut rx = state.gateway.subscribe();

        let result = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::OFFER_ACCEPT,
                json!({ "needId": "need_1", "offerId": "ofr_elsewhere", "orderId": "ord_1" }),
            ),
        )
        .await;

        assert!(matches!(
            result,
            Err(Skipped::NotFound { kind: "offer", ref id }) if id == "ofr_elsewhere"
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn offer_accept_with_single_offer_rejects_nobody() {
        let (state, store) = test_state();
        store.insert_need(need("need_1", "usr_c"));
        store.insert_offer(offer("ofr_win", "need_1", "sel_a", 120.0));

        let notified = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::OFFER_ACCEPT,
                json!({ "needId": "need_1", "offerId": "ofr_win", "orderId": "ord_1" }),
            ),
        )
        .await
        .unwrap();
        assert_eq!(notified.len(), 2);
        assert!(notified.rooms_for(EventName::OFFER_REJECTED).is_empty());
    }

    #[tokio::test]
    async fn order_new_goes_to_seller_with_order_details() {
        let (state, store) = test_state();
        store.insert_order(order("ord_1", "usr_c", "sel_a"));
        let mut rx = state.gateway.subscribe();

        let notified = dispatch(
            &state,
            &customer_session(),
            event(EventName::ORDER_NEW, json!({ "orderId": "ord_1" })),
        )
        .await
        .unwrap();
        assert_eq!(
            notified.rooms_for(EventName::ORDER_NEW),
            vec![&Room::seller("sel_a")]
        );

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.data["orderNumber"], "ORD-ord_1");
        assert_eq!(payload.data["customerId"], "usr_c");
        assert_eq!(payload.data["totalAmount"], 120.0);
    }

    #[tokio::test]
    async fn order_assign_and_complete_go_to_customer() {
        let (state, store) = test_state();
        store.insert_order(order("ord_1", "usr_c", "sel_a"));
        let seller_session =
            GatewaySession::new("conn_s".into(), Principal::Seller { id: "usr_s".into() });

        for name in [EventName::ORDER_ASSIGN, EventName::ORDER_COMPLETE] {
            let notified = dispatch(
                &state,
                &seller_session,
                event(name, json!({ "orderId": "ord_1" })),
            )
            .await
            .unwrap();
            assert_eq!(notified.rooms_for(name), vec![&Room::user("usr_c")]);
        }
    }

    #[tokio::test]
    async fn chat_message_joins_sender_and_targets_chat_room() {
        let (state, _store) = test_state();
        let session = customer_session();
        let mut rx = state.gateway.subscribe();

        let notified = dispatch(
            &state,
            &session,
            event(
                EventName::CHAT_MESSAGE,
                json!({ "orderId": "ord_1", "message": " hello " }),
            ),
        )
        .await
        .unwrap();

        assert!(session.is_member(&Room::chat("ord_1")));
        assert_eq!(
            notified.rooms_for(EventName::CHAT_MESSAGE),
            vec![&Room::chat("ord_1")]
        );

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.data["senderId"], "usr_c");
        assert_eq!(payload.data["senderRole"], "customer");
        assert_eq!(payload.data["message"], "hello");
    }

    #[tokio::test]
    async fn empty_chat_message_is_skipped() {
        let (state, _store) = test_state();
        let result = dispatch(
            &state,
            &customer_session(),
            event(
                EventName::CHAT_MESSAGE,
                json!({ "orderId": "ord_1", "message": "   " }),
            ),
        )
        .await;
        assert!(matches!(result, Err(Skipped::MalformedPayload { .. })));
    }

    #[tokio::test]
    async fn chat_join_emits_nothing() {
        let (state, _store) = test_state();
        let session = customer_session();
        let notified = dispatch(
            &state,
            &session,
            event(EventName::CHAT_JOIN, json!({ "orderId": "ord_7" })),
        )
        .await
        .unwrap();
        assert!(notified.is_empty());
        assert!(session.is_member(&Room::chat("ord_7")));
    }

    #[tokio::test]
    async fn malformed_and_unknown_events_are_skipped() {
        let (state, _store) = test_state();
        let session = customer_session();

        let result = dispatch(
            &state,
            &session,
            event(EventName::OFFER_ACCEPT, json!({ "needId": "need_1" })),
        )
        .await;
        assert!(matches!(result, Err(Skipped::MalformedPayload { .. })));

        let result = dispatch(&state, &session, event("wallet:drain", json!({}))).await;
        assert!(matches!(result, Err(Skipped::UnknownEvent(name)) if name == "wallet:drain"));
    }
}
