/*!

This is the long-form manual for `review_assignment` and `reviewsplit`.

## Input formats

The input is a table of review records, one review per row. The first row holds
the column names. The following columns are read, all others are ignored:

| column              | required | content                                          |
|---------------------|----------|--------------------------------------------------|
| `Item ID`           | yes      | text or number identifying the reviewed item      |
| `Reviewer`          | yes      | email-like identifier of the reviewer            |
| `Review ID`         | no       | identifier of the review                         |
| `Review Updated At` | no       | last update of the review (date text or serial)  |

The following file types are supported:
* `excel` Excel workbooks (`.xlsx`, `.xls`) and OpenDocument spreadsheets (`.ods`).
  The first worksheet is used unless a worksheet name is given.
* `csv` Comma Separated Values with a header line.

Item ids are compared through their text form: the number `12` and the text `12` are the
same item. A cell left empty in the `Reviewer` column is allowed, the row then counts
towards the totals but gives no reviewer. An empty `Item ID` cell stops the run.

## Eligible reviewers

Only reviewers whose identifier ends with the reviewer suffix (`snowcorp.com` by default)
receive items. The comparison ignores case: `Foo@SNOWCORP.COM` is eligible,
`foo@snowcorp.com.evil.com` is not.

## Selection policies

### `uniqueItems` (default)

1. all the distinct item ids are collected
2. `floor(unique items * percentage / 100)` of them are selected
3. every eligible reviewer receives `floor(selected / reviewers)` items
4. the items are shuffled and cut into consecutive slices, one per reviewer, in the order
   the reviewers first appear in the input

No item is given to two reviewers. The items left over by the division in step 3 are not
assigned: with 10 items, 100% and 3 reviewers, each reviewer gets 3 items and one item is
left out. The summary reports it as the shortfall.

### `perReviewerPercentage`

Every reviewer keeps `floor(rows of that reviewer * percentage / 100)` of the items in the
rows that name them. Items are not deduplicated: an item reviewed by two people can be
given to both. This reproduces the first exports of the tool.

### `newestRecordWins`

Like `perReviewerPercentage`, but when an item appears in several rows only the row with
the latest `Review Updated At` is kept. The reviewer of that row owns the item.

## Output

The assignments are written as one row per reviewer and item, with the columns `Reviewer`
and `Item ID`. The file type follows the extension of the output file (`.xlsx` or `.csv`),
`round2.xlsx` by default.

A JSON summary is also produced:

```text
{
  "config": { "percentage": 10, "policy": "uniqueItems", ... },
  "results": {
    "totalItems": 120,
    "uniqueItems": 100,
    "targetItems": 10,
    "assignedItems": 9,
    "shortfall": 1,
    "assignments": [ { "reviewer": "a@snowcorp.com", "itemIds": [ "12", "57", "3" ] }, ... ]
  }
}
```

## Reproducible runs

Every run draws fresh random numbers. Passing a seed (`--seed` or `randomSeed` in the
configuration) makes the run reproducible, which allows checking a run against a stored
summary with `--reference`.

*/
