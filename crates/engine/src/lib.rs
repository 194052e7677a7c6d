pub use actor::Actor;
pub use cards::License;
pub use commands::{
    AdjustBalanceCmd, CreateOrderCmd, PayForCardsCmd, PaymentListFilter, RecordPaymentCmd,
};
pub use error::EngineError;
pub use gateway::{
    BankConfig, BankGateway, CallbackEvent, CreatedOrder, EcommConfig, EcommGateway,
    GatewayAdapter, GatewayError, GatewayRegistry, GatewayStatus,
};
pub use gateways::GatewayKind;
pub use money::Money;
pub use ops::{
    BulkOrderOutcome, CardActivation, CardOrderResult, CreatedPaymentOrder, DistributionLine,
    DistributionReport, Engine, EngineBuilder, LicensePurchase, OrderState, Transition,
};
pub use payments::{Payment, PaymentKind, STATUS_COMPLETED, STATUS_FAILED, STATUS_PENDING};

mod actor;
pub mod cards;
pub mod cities;
mod commands;
pub mod countries;
pub mod dister_gardens;
pub mod disters;
mod error;
pub mod gardens;
pub mod gateway;
pub mod gateways;
pub mod groups;
mod money;
mod ops;
pub mod payments;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
