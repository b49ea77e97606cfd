//! File formats for catreg: OBJ meshes, catheter folders, CSV histogram
//! tables and JSON transforms and reports.

pub mod catheter_io;
pub mod obj_io;
pub mod table_io;

pub use catheter_io::{list_catheter_files, read_catheter_folder, write_catheter_folder};
pub use obj_io::{parse_obj, read_obj, write_obj};
pub use table_io::{
    read_histogram_csv, read_transform_json, write_histogram_csv, write_report_json, write_transform_json,
    TransformRecord,
};
