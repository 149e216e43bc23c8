pub mod datatype;
pub mod entity;
pub mod geo;
pub mod notification;
pub mod pricing;
pub mod recommendation;
pub mod report;
pub mod service;
pub mod validation;

mod transform;
