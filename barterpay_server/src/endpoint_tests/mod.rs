mod helpers;
mod mocks;

mod checkout;
mod notifications;
mod orders;
