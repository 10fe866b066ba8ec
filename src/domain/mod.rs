pub mod cart;
pub mod city;
pub mod quote;
pub mod route;

pub use cart::LineItem;
pub use city::{normalize_city_name, City, CityId, NewCity};
pub use quote::Quote;
pub use route::{NewRoute, Route, RouteId, RoutePrices};
