pub mod catalog;
pub mod equip;
pub mod inventory;
pub mod wallet;

pub use catalog::{cosmetic_item, MemoryCatalog, RewardCatalog, RewardItem};
pub use equip::{EquipState, MemoryEquip};
pub use inventory::{InventoryStore, MemoryInventory};
pub use wallet::{MemoryWallet, WalletLedger, WalletRecord};
