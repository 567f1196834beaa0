//! Integration flows.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod bus_flows;
#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod triage_flows;
