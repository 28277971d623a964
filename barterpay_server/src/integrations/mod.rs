pub mod barterpay;
