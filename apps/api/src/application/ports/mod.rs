pub mod billing_gateway;
