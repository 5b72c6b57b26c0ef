//! Background work that lives outside the single-threaded map, such as the
//! janitor that sweeps a shared map on a fixed interval.

pub(crate) mod janitor;
