pub mod cargo;
pub mod go;
pub mod node;

use crate::domain::model::ResolverType;
use crate::domain::ports::Resolver;

pub fn resolver_for(resolver: ResolverType) -> Box<dyn Resolver> {
    match resolver {
        ResolverType::Cargo => Box::new(cargo::CargoResolver),
        ResolverType::Node => Box::new(node::NodeResolver),
        ResolverType::Go => Box::new(go::GoResolver),
    }
}
