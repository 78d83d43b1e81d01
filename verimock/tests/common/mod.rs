// vim: tw=80
//! A mock written the way the code generator writes them, for a small
//! `Screen` trait.
#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use verimock::*;

pub trait Screen {
    fn show(&self, message: String);
    fn flash(&self, message: String, duration: i32);
    fn some_value(&self) -> String;
    fn multiple_params_and_return_value(&self, message: String, n: i32)
        -> String;
    /// A variadic method: the tail is passed as one parameter.
    fn array_param(&self, values: Vec<String>);
    fn optional_value(&self) -> Option<String>;
    fn error_return_value(&self) -> Result<(), String>;
    fn multi_return(&self) -> (i32, String);
}

#[derive(Clone, Debug, Default)]
pub struct MockScreen {
    mock: GenericMock,
}

impl MockScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MockOptions) -> Self {
        MockScreen { mock: GenericMock::with_options(options) }
    }

    pub fn generic_mock(&self) -> &GenericMock {
        &self.mock
    }

    pub fn verify_was_called_once(&self) -> VerifierScreen<'_> {
        self.verify_was_called(once())
    }

    pub fn verify_was_called(&self, times: Times) -> VerifierScreen<'_> {
        VerifierScreen {
            mock: &self.mock,
            verification: Verification::new(times),
        }
    }

    pub fn verify_was_called_in_order<'a>(&'a self, times: Times,
                                          ctx: &'a InOrderContext)
        -> VerifierScreen<'a>
    {
        VerifierScreen {
            mock: &self.mock,
            verification: Verification::in_order(times, ctx),
        }
    }

    pub fn verify_was_called_eventually(&self, times: Times, timeout: Duration)
        -> VerifierScreen<'_>
    {
        VerifierScreen {
            mock: &self.mock,
            verification: Verification::eventually(times, timeout),
        }
    }
}

impl Screen for MockScreen {
    fn show(&self, message: String) {
        self.mock.invoke("show", params![message], &[]);
    }

    fn flash(&self, message: String, duration: i32) {
        self.mock.invoke("flash", params![message, duration], &[]);
    }

    fn some_value(&self) -> String {
        self.mock.invoke("some_value", params![],
                         &[ReturnType::of::<String>()])
            .take(0)
    }

    fn multiple_params_and_return_value(&self, message: String, n: i32)
        -> String
    {
        self.mock.invoke("multiple_params_and_return_value",
                         params![message, n],
                         &[ReturnType::of::<String>()])
            .take(0)
    }

    fn array_param(&self, values: Vec<String>) {
        self.mock.invoke("array_param", params![values], &[]);
    }

    fn optional_value(&self) -> Option<String> {
        self.mock.invoke("optional_value", params![],
                         &[ReturnType::nilable::<Option<String>>()])
            .take(0)
    }

    fn error_return_value(&self) -> Result<(), String> {
        self.mock.invoke("error_return_value", params![],
                         &[ReturnType::nilable::<Result<(), String>>()])
            .take(0)
    }

    fn multi_return(&self) -> (i32, String) {
        let mut r = self.mock.invoke("multi_return", params![],
                                     &[ReturnType::of::<i32>(),
                                       ReturnType::of::<String>()]);
        (r.take(0), r.take(1))
    }
}

pub struct VerifierScreen<'a> {
    mock: &'a GenericMock,
    verification: Verification<'a>,
}

impl<'a> VerifierScreen<'a> {
    fn verify(&self, method: &str, params: Vec<Param>) -> OngoingVerification {
        OngoingVerification::new(
            self.mock.verify(&self.verification, method, params))
    }

    pub fn show(&self, message: String) -> ShowVerification {
        ShowVerification(self.verify("show", params![message]))
    }

    pub fn flash(&self, message: String, duration: i32) -> FlashVerification {
        FlashVerification(self.verify("flash", params![message, duration]))
    }

    pub fn some_value(&self) -> OngoingVerification {
        self.verify("some_value", params![])
    }

    pub fn multiple_params_and_return_value(&self, message: String, n: i32)
        -> OngoingVerification
    {
        self.verify("multiple_params_and_return_value", params![message, n])
    }

    pub fn array_param(&self, values: Vec<String>) -> ArrayParamVerification {
        ArrayParamVerification(self.verify("array_param", params![values]))
    }

    pub fn optional_value(&self) -> OngoingVerification {
        self.verify("optional_value", params![])
    }
}

pub struct ShowVerification(pub OngoingVerification);

impl ShowVerification {
    pub fn get_captured_arguments(&self) -> Option<String> {
        self.0.captured(0)
    }

    pub fn get_all_captured_arguments(&self) -> Vec<String> {
        self.0.all_captured(0)
    }
}

pub struct FlashVerification(pub OngoingVerification);

impl FlashVerification {
    pub fn get_captured_arguments(&self) -> Option<(String, i32)> {
        Some((self.0.captured(0)?, self.0.captured(1)?))
    }

    pub fn get_all_captured_arguments(&self) -> (Vec<String>, Vec<i32>) {
        (self.0.all_captured(0), self.0.all_captured(1))
    }
}

pub struct ArrayParamVerification(pub OngoingVerification);

impl ArrayParamVerification {
    pub fn get_captured_arguments(&self) -> Option<Vec<String>> {
        self.0.captured(0)
    }

    pub fn get_all_captured_arguments(&self) -> Vec<Vec<String>> {
        self.0.all_captured(0)
    }
}

/// A fail handler that records messages instead of panicking.
pub fn collecting_handler() -> (FailHandler, Arc<Mutex<Vec<String>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let m2 = messages.clone();
    let handler: FailHandler = Arc::new(move |message: &str, _skip: usize| {
        m2.lock().unwrap().push(message.to_owned());
    });
    (handler, messages)
}
