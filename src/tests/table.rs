use super::html_opts;

fn on(o: &mut crate::Options) {
    o.extension.table = true;
}

#[test]
fn basic_table() {
    html_opts(
        "|a|b|\n|-|-|\n|1|2|\n",
        "<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n\
         <tbody>\n<tr>\n<td>1</td>\n<td>2</td>\n</tr>\n</tbody>\n</table>\n",
        on,
    );
}

#[test]
fn header_only_table() {
    html_opts(
        "| a | b |\n| --- | --- |\n",
        "<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n</table>\n",
        on,
    );
}

#[test]
fn alignments() {
    html_opts(
        "| l | c | r |\n| :-- | :-: | --: |\n| 1 | 2 | 3 |\n",
        "<table>\n<thead>\n<tr>\n<th align=\"left\">l</th>\n<th align=\"center\">c</th>\n\
         <th align=\"right\">r</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td align=\"left\">1</td>\n\
         <td align=\"center\">2</td>\n<td align=\"right\">3</td>\n</tr>\n</tbody>\n</table>\n",
        on,
    );
}

#[test]
fn cell_count_mismatch_is_padded_or_truncated() {
    html_opts(
        "|a|b|\n|-|-|\n|1|\n|1|2|3|\n",
        "<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n\
         <tbody>\n<tr>\n<td>1</td>\n<td></td>\n</tr>\n<tr>\n<td>1</td>\n<td>2</td>\n</tr>\n\
         </tbody>\n</table>\n",
        on,
    );
}

#[test]
fn escaped_pipe_stays_in_cell() {
    html_opts(
        "|a\\|b|\n|-|\n",
        "<table>\n<thead>\n<tr>\n<th>a|b</th>\n</tr>\n</thead>\n</table>\n",
        on,
    );
}

#[test]
fn mismatched_delimiter_row_is_not_a_table() {
    html_opts("|a|b|\n|-|\n", "<p>|a|b|\n|-|</p>\n", on);
}

#[test]
fn inline_markup_in_cells() {
    html_opts(
        "| *a* |\n| - |\n| `c` |\n",
        "<table>\n<thead>\n<tr>\n<th><em>a</em></th>\n</tr>\n</thead>\n\
         <tbody>\n<tr>\n<td><code>c</code></td>\n</tr>\n</tbody>\n</table>\n",
        on,
    );
}

#[test]
fn disabled_by_default() {
    super::html("|a|b|\n|-|-|\n", "<p>|a|b|\n|-|-|</p>\n");
}
