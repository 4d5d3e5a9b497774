pub mod addr;
pub mod datacenter;
pub mod flow_table;
pub mod routing;
pub mod topology;
