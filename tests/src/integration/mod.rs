//! Integration flows.

mod switch_flows;
