//! Backend forwarding to the page's React wallet layer
//!
//! The page exposes `window.reactWalletFunctions` with promise-returning
//! functions. Outcomes are pushed onto the bridge's event queue from
//! `spawn_local` tasks.

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};

use super::{
    EventQueue, RequestId, WalletBackend, WalletError, WalletEvent, WalletStatus, entry_point,
};
use crate::contract::ContractCall;

const API_GLOBAL: &str = "reactWalletFunctions";

pub struct ReactWalletBackend {
    api: Object,
    events: EventQueue,
}

impl ReactWalletBackend {
    /// None when the page has no wallet layer
    pub fn detect(events: EventQueue) -> Option<Self> {
        let window = web_sys::window()?;
        let api = Reflect::get(&window, &JsValue::from_str(API_GLOBAL)).ok()?;
        if api.is_undefined() || api.is_null() {
            return None;
        }
        let api = api.dyn_into::<Object>().ok()?;
        Some(Self { api, events })
    }

    fn invoke(&self, name: &str, args: &[JsValue]) -> Result<JsValue, WalletError> {
        let func = Reflect::get(&self.api, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| {
                log::warn!("{}.{} is not a function", API_GLOBAL, name);
                WalletError::Unavailable
            })?;
        let js_args = Array::new();
        for arg in args {
            js_args.push(arg);
        }
        func.apply(&self.api, &js_args)
            .map_err(|e| WalletError::Rejected(describe(&e)))
    }

    /// Await the returned value (plain values resolve immediately) and queue the outcome
    fn deliver<F>(&self, returned: JsValue, request: RequestId, action: &'static str, on_ok: F)
    where
        F: FnOnce(JsValue) -> WalletEvent + 'static,
    {
        let events = self.events.clone();
        let promise = Promise::resolve(&returned);
        spawn_local(async move {
            let event = match JsFuture::from(promise).await {
                Ok(value) => on_ok(value),
                Err(err) => WalletEvent::Failed {
                    request,
                    action,
                    reason: describe(&err),
                },
            };
            events.borrow_mut().push_back(event);
        });
    }
}

impl WalletBackend for ReactWalletBackend {
    fn name(&self) -> &'static str {
        "react"
    }

    fn connect(&mut self, request: RequestId) -> Result<(), WalletError> {
        let returned = self.invoke("connectWallet", &[])?;
        let api = self.api.clone();
        self.deliver(returned, request, "connectWallet", move |value| {
            // Some wallet layers resolve with nothing and only update their status
            let account = account_of(&value).or_else(|| read_status(&api).account);
            match account {
                Some(account) => WalletEvent::Connected { request, account },
                None => WalletEvent::Failed {
                    request,
                    action: "connectWallet",
                    reason: "no account returned".to_string(),
                },
            }
        });
        Ok(())
    }

    fn disconnect(&mut self, request: RequestId) -> Result<(), WalletError> {
        let returned = self.invoke("disconnectWallet", &[])?;
        self.deliver(returned, request, "disconnectWallet", move |_| {
            WalletEvent::Disconnected { request }
        });
        Ok(())
    }

    fn status(&self) -> WalletStatus {
        read_status(&self.api)
    }

    fn send(&mut self, request: RequestId, call: &ContractCall) -> Result<(), WalletError> {
        let tx = transaction(call);
        let args = match call {
            ContractCall::SubmitGameScore { score } => vec![JsValue::from_f64(*score as f64), tx],
            ContractCall::ClaimQuestReward { quest_id } => {
                vec![JsValue::from_f64(*quest_id as f64), tx]
            }
            _ => vec![tx],
        };
        let returned = self.invoke(entry_point(call), &args)?;
        let function = call.function_name();
        self.deliver(returned, request, function, move |value| {
            WalletEvent::Completed {
                request,
                function,
                result: value.as_string().unwrap_or_else(|| describe(&value)),
            }
        });
        Ok(())
    }
}

/// `{ signature, calldata, view, payable }` handed to every contract function
fn transaction(call: &ContractCall) -> JsValue {
    let tx = Object::new();
    let fields = [
        ("signature", JsValue::from_str(&call.signature())),
        ("calldata", JsValue::from_str(&call.calldata_hex())),
        ("view", JsValue::from_bool(call.is_view())),
        ("payable", JsValue::from_bool(call.is_payable())),
    ];
    for (key, value) in fields {
        let _ = Reflect::set(&tx, &JsValue::from_str(key), &value);
    }
    tx.into()
}

fn read_status(api: &Object) -> WalletStatus {
    let Ok(func) = Reflect::get(api, &JsValue::from_str("getWalletStatus"))
        .and_then(|f| f.dyn_into::<Function>())
    else {
        return WalletStatus::default();
    };
    let Ok(status) = func.call0(api) else {
        return WalletStatus::default();
    };
    let connected = Reflect::get(&status, &JsValue::from_str("isConnected"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    WalletStatus {
        connected,
        account: if connected { account_of(&status) } else { None },
    }
}

/// Account id from a string or `{ accountId }` / `{ account }` object
fn account_of(value: &JsValue) -> Option<String> {
    if let Some(s) = value.as_string() {
        return Some(s);
    }
    if !value.is_object() {
        return None;
    }
    ["accountId", "account"].iter().find_map(|key| {
        Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    })
}

fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
