mod treewidth_dp;

pub use treewidth_dp::TreewidthDp;
