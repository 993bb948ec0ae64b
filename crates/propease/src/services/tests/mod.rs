mod common;
mod files;
mod leases;
mod maintenance;
