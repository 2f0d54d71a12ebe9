//! Nested admin slice, built from a static handler body

use saga_store::{Handler, Reducer, StoreError};
use serde::Deserialize;
use serde_json::json;

pub const NESTED_REQ_ONE: &str = "NESTED_REQ_ONE";
pub const NESTED_REC_ONE: &str = "NESTED_REC_ONE";

#[derive(Deserialize)]
struct Received {
    nested: Item,
}

#[derive(Deserialize)]
struct Item {
    name: String,
}

pub fn reducer() -> Result<Reducer, StoreError> {
    Reducer::with_body(
        json!({"isLoading": false, "name": ""}),
        [
            (NESTED_REQ_ONE, Handler::patch(json!({"isLoading": true}))?),
            (
                NESTED_REC_ONE,
                Handler::reduce(|_, action| {
                    let received: Received = action.payload_as()?;
                    Ok(Some(json!({"isLoading": false, "name": received.nested.name})))
                }),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_store::Action;

    #[test]
    fn test_request_then_receive() {
        let reducer = reducer().unwrap();
        let loading = reducer
            .reduce(reducer.initial(), &Action::new(NESTED_REQ_ONE).with("id", "1"))
            .unwrap();
        assert_eq!(loading["isLoading"], json!(true));

        let received = reducer
            .reduce(
                &loading,
                &Action::new(NESTED_REC_ONE).with("nested", json!({"id": "1", "name": "Root"})),
            )
            .unwrap();
        assert_eq!(received["isLoading"], json!(false));
        assert_eq!(received["name"], json!("Root"));
    }

    #[test]
    fn test_malformed_receive_is_reducer_error() {
        let reducer = reducer().unwrap();
        assert!(reducer
            .reduce(reducer.initial(), &Action::new(NESTED_REC_ONE))
            .is_err());
    }
}
