pub mod living_network;
