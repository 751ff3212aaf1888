//! Post-parse numbering of `implicit-ordinal` items

use super::ddl::DdlSchema;
use super::DicFile;
use crate::logging::codes;
use crate::model::Value;
use crate::{log_debug, log_success};

/// Number the rows of every `implicit-ordinal` item in the first block.
///
/// For each such item of the DDL whose category has a table, the item's
/// column is added when missing and set to `1..=N` down the rows,
/// replacing whatever it held. Returns the number of columns numbered.
pub fn insert_implicit_ordinal_items(dic: &mut DicFile, schema: &DdlSchema) -> usize {
    let Some(block) = dic.file.first_block_mut() else {
        return 0;
    };

    let mut numbered = 0;
    for (category, column) in schema.implicit_ordinal_items() {
        let Some(table) = block.table_mut(&category) else {
            continue;
        };

        let col = table.ensure_column(&column);
        let result = (0..table.row_count())
            .try_for_each(|row| table.set_cell(row, col, Value::text((row + 1).to_string())));
        if let Err(e) = result {
            crate::log_error!(e.error_code(), "Failed to number implicit ordinal",
                "category" => category,
                "error" => e
            );
            continue;
        }

        log_debug!("Implicit ordinal numbered",
            "category" => category,
            "column" => column,
            "rows" => table.row_count()
        );
        numbered += 1;
    }

    log_success!(
        codes::success::IMPLICIT_ORDINALS_ASSIGNED,
        "Implicit ordinal items assigned",
        "columns" => numbered
    );
    numbered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::ddl::tests::mini_schema;
    use crate::model::Table;

    #[test]
    fn test_ordinals_numbered_per_table() {
        let schema = mini_schema();
        let mut dic = DicFile::new();
        let name = dic.file_mut().add_block("mini_dic");
        let block = dic.file_mut().block_mut(&name).unwrap();

        let mut poly = Table::new("entity_poly");
        poly.add_column("entity_id").unwrap();
        for id in ["A", "B", "C"] {
            poly.add_row_values(vec![Value::text(id)]).unwrap();
        }
        block.write_table(poly);

        assert_eq!(insert_implicit_ordinal_items(&mut dic, &schema), 1);

        let poly = dic.first_block().unwrap().table("entity_poly").unwrap();
        assert_eq!(poly.columns(), &["entity_id", "ordinal"]);
        let ordinals: Vec<_> = poly
            .column_values("ordinal")
            .unwrap()
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(ordinals, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_existing_values_are_renumbered() {
        let schema = mini_schema();
        let mut dic = DicFile::new();
        let name = dic.file_mut().add_block("d");
        let mut poly = Table::new("entity_poly");
        poly.add_column("ordinal").unwrap();
        poly.add_row_values(vec![Value::text("7")]).unwrap();
        poly.add_row_values(vec![Value::Unknown]).unwrap();
        dic.file_mut().block_mut(&name).unwrap().write_table(poly);

        insert_implicit_ordinal_items(&mut dic, &schema);

        let poly = dic.first_block().unwrap().table("entity_poly").unwrap();
        assert_eq!(poly.cell(0, "ordinal"), Some(&Value::text("1")));
        assert_eq!(poly.cell(1, "ordinal"), Some(&Value::text("2")));
    }

    #[test]
    fn test_missing_tables_and_blocks_are_skipped() {
        let schema = mini_schema();
        let mut empty = DicFile::new();
        assert_eq!(insert_implicit_ordinal_items(&mut empty, &schema), 0);

        let mut dic = DicFile::new();
        dic.file_mut().add_block("d");
        assert_eq!(insert_implicit_ordinal_items(&mut dic, &schema), 0);
    }
}
