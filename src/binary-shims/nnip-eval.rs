fn main() { nnip_tasks::entry_points::nnip_eval() }
