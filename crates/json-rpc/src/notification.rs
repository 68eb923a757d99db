use crate::{Response, ResponsePayload};
use alloy_primitives::U256;
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Serialize,
};

/// An Ethereum-style notification, not to be confused with a JSON-RPC
/// notification.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EthNotification<T = Box<serde_json::value::RawValue>> {
    /// The subscription ID.
    pub subscription: U256,
    /// The notification payload.
    pub result: T,
}

/// An item received over an Ethereum pubsub transport.
///
/// Ethereum pubsub uses a non-standard JSON-RPC notification format. An item
/// received over a pubsub transport may be a [`Response`] to a JSON-RPC
/// request, or an Ethereum-style notification.
#[derive(Clone, Debug)]
pub enum PubSubItem {
    /// A [`Response`] to a JSON-RPC request.
    Response(Response),
    /// An Ethereum-style notification.
    Notification(EthNotification),
}

impl<'de> Deserialize<'de> for PubSubItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PubSubItemVisitor;

        impl<'de> Visitor<'de> for PubSubItemVisitor {
            type Value = PubSubItem;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a JSON-RPC response or an Ethereum-style notification")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut id = None;
                let mut params: Option<EthNotification> = None;
                let mut subscription = None;
                let mut result = None;
                let mut error = None;

                // Drain the map into the appropriate fields. `eth_subscription`
                // frames carry `{subscription, result}` nested in `params`;
                // some servers flatten them to the top level.
                while let Ok(Some(key)) = map.next_key::<&str>() {
                    match key {
                        "id" => {
                            if id.is_some() {
                                return Err(serde::de::Error::duplicate_field("id"));
                            }
                            id = Some(map.next_value()?);
                        }
                        "params" => {
                            if params.is_some() {
                                return Err(serde::de::Error::duplicate_field("params"));
                            }
                            params = Some(map.next_value()?);
                        }
                        "subscription" => {
                            if subscription.is_some() {
                                return Err(serde::de::Error::duplicate_field("subscription"));
                            }
                            subscription = Some(map.next_value()?);
                        }
                        "result" => {
                            if result.is_some() {
                                return Err(serde::de::Error::duplicate_field("result"));
                            }
                            result = Some(map.next_value()?);
                        }
                        "error" => {
                            if error.is_some() {
                                return Err(serde::de::Error::duplicate_field("error"));
                            }
                            error = Some(map.next_value()?);
                        }
                        // Discard unknown fields.
                        _ => {
                            let _ = map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }

                // If it has an ID, it is a response.
                if let Some(id) = id {
                    if subscription.is_some() {
                        return Err(serde::de::Error::custom(
                            "unexpected subscription in pubsub item",
                        ));
                    }
                    // We need to differentiate error vs result here.
                    let payload = if let Some(error) = error {
                        ResponsePayload::Failure(error)
                    } else if let Some(result) = result {
                        ResponsePayload::Success(result)
                    } else {
                        return Err(serde::de::Error::custom(
                            "missing `result` or `error` field in response",
                        ));
                    };
                    Ok(PubSubItem::Response(Response { id, payload }))
                } else {
                    // Notifications cannot have an error.
                    if error.is_some() {
                        return Err(serde::de::Error::custom(
                            "unexpected `error` field in subscription notification",
                        ));
                    }
                    if let Some(notification) = params {
                        return Ok(PubSubItem::Notification(notification));
                    }
                    // Notifications must have a subscription and a result.
                    let subscription = subscription
                        .ok_or_else(|| serde::de::Error::missing_field("subscription"))?;
                    let result =
                        result.ok_or_else(|| serde::de::Error::missing_field("result"))?;

                    Ok(PubSubItem::Notification(EthNotification { subscription, result }))
                }
            }
        }

        deserializer.deserialize_any(PubSubItemVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Id;

    #[test]
    fn deser_response_item() {
        let json = r#"{"jsonrpc":"2.0","id":3,"result":"0x1"}"#;
        let item: PubSubItem = serde_json::from_str(json).unwrap();
        match item {
            PubSubItem::Response(resp) => {
                assert_eq!(resp.id, Id::Number(3));
                assert!(resp.is_success());
            }
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn deser_notification_item() {
        let json = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0xcd0c3e8af590364c09d0fa6a1210faf5","result":{"number":"0x1"}}}"#;
        let item: PubSubItem = serde_json::from_str(json).unwrap();
        match item {
            PubSubItem::Notification(n) => {
                assert_eq!(
                    n.subscription,
                    U256::from_str_radix("cd0c3e8af590364c09d0fa6a1210faf5", 16).unwrap()
                );
            }
            _ => panic!("expected notification"),
        }
    }

    #[test]
    fn deser_flattened_notification_item() {
        let json = r#"{"subscription":"0x1","result":"0xdead"}"#;
        let item: PubSubItem = serde_json::from_str(json).unwrap();
        assert!(matches!(item, PubSubItem::Notification(_)));
    }

    #[test]
    fn rejects_notification_with_error() {
        let json = r#"{"subscription":"0x1","result":"0x1","error":{"code":1,"message":"no"}}"#;
        assert!(serde_json::from_str::<PubSubItem>(json).is_err());
    }
}
