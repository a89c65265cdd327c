pub mod demand_prediction;
pub mod inventory;
pub mod order;
pub mod order_item;
pub mod product;

pub use demand_prediction::{Entity as DemandPredictionEntity, Model as DemandPrediction};
pub use inventory::{Entity as InventoryEntity, Model as InventorySnapshot};
pub use product::{Entity as ProductEntity, Model as ProductModel};
